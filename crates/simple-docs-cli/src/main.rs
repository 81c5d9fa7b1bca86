use std::process;

fn main() {
    match simple_docs_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("simple-docs error: {err:#}");
            process::exit(1);
        }
    }
}
