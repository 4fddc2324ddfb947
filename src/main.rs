fn main() {
    if let Err(err) = siniestros::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
