fn main() {
    if let Err(e) = eyeclinic_lib::run() {
        eprintln!("eyeclinic: {e}");
        std::process::exit(1);
    }
}
