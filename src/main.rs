fn main() {
    if let Err(err) = schema_parity::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
