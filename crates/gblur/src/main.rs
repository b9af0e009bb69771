use gblur::app::{self, Args};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();

    let report = app::run(&args)?;
    println!(
        "{} -> {} in {:.6}s",
        args.input_path.display(),
        args.output_path.display(),
        report.elapsed.as_secs_f64()
    );

    Ok(())
}
