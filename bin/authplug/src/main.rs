use authplug::run;

fn main() {
    let code = match run() {
        Ok(code) => code,
        // Default error handling prints the error in detailed format.
        Err(error) => {
            eprintln!("authplug process failed: {:?}", error);
            1
        }
    };
    std::process::exit(code);
}
