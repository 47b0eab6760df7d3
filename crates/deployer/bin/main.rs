fn main() {
    if let Err(err) = deployer::args::run() {
        let _ = deployer_common::sh_err!("{err:?}");
        std::process::exit(1);
    }
}
