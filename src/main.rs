fn main() {
    if let Err(err) = somkey::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
