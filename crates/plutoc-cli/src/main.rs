use std::{env, fs, process::ExitCode, time::Instant};

use plutoc::{compile, CompileOptions};
use plutoc_type_checking::{type_check, SourceFile};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let file_path = if args.len() > 1 { &args[1] } else { "validator.py" };
    let entry_point = if args.len() > 2 { args[2].clone() } else { "validator".to_owned() };

    let code = match read_file(file_path) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    match type_check(&SourceFile::new(&code, file_path), None) {
        Ok(Some(report)) => eprintln!("type checking failed:\n{report}"),
        Ok(None) => eprintln!("type checking succeeded"),
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    }
    eprintln!("time taken to type-check: {:?}", start.elapsed());

    let start = Instant::now();
    let mut options = CompileOptions::new(entry_point);
    options.log_fold_skips = true;
    match compile(&code, &options) {
        Ok(term) => {
            let elapsed = start.elapsed();
            eprintln!("compiled successfully after: {elapsed:?}");
            println!("{}", term.to_uplc_text());
            ExitCode::SUCCESS
        }
        Err(err) => {
            let elapsed = start.elapsed();
            eprintln!("error after: {elapsed:?}\n{}", err.render(&code));
            ExitCode::FAILURE
        }
    }
}

fn read_file(file_path: &str) -> Result<String, String> {
    eprintln!("Reading file: {file_path}");
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("Error: {file_path} is not a file"));
            }
        }
        Err(err) => {
            return Err(format!("Error reading {file_path}: {err}"));
        }
    }
    match fs::read_to_string(file_path) {
        Ok(contents) => Ok(contents),
        Err(err) => Err(format!("Error reading file: {err}")),
    }
}
