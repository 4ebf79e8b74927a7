fn main() {
    if let Err(e) = slate_drv::main() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
