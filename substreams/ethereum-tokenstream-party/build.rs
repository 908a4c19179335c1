use anyhow::Result;
use substreams_ethereum::Abigen;

fn main() -> Result<(), anyhow::Error> {
    Abigen::new("StreamDeployer", "abi/StreamDeployer.json")?
        .generate()?
        .write_to_file("src/abi/stream_deployer.rs")?;
    Abigen::new("MultiStream", "abi/MultiStream.json")?
        .generate()?
        .write_to_file("src/abi/multi_stream.rs")?;
    Abigen::new("SimpleStream", "abi/SimpleStream.json")?
        .generate()?
        .write_to_file("src/abi/simple_stream.rs")?;
    Abigen::new("NamedStreams", "abi/NamedStreams.json")?
        .generate()?
        .write_to_file("src/abi/named_streams.rs")?;
    anyhow::Ok(())
}
