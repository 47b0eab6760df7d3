//! Deploys the `LogStore` contract.

fn main() {
    deployer::script::main("LogStore")
}
