//! Deploys the `RedPacket` contract.

fn main() {
    deployer::script::main("RedPacket")
}
