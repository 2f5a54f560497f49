use dump_fetch::{cli, errors::AppError};
use std::process::ExitCode;

fn main() -> ExitCode {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => return report(&AppError::Io(e)),
    };

    match rt.block_on(cli::cli()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

fn report(err: &AppError) -> ExitCode {
    eprintln!("{}", err.diagnostic());
    let code = err.exit_code().clamp(1, 255);
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
