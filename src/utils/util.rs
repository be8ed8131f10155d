use std::fmt::Display;

pub type Result<T> = std::result::Result<T, String>;

pub fn handle_error_and_exit(err: impl Display) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}
