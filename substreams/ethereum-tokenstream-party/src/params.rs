use anyhow::anyhow;
use serde::Deserialize;

use crate::identity::{ActivityKeyScheme, SchemaGeneration, SchemaPolicy};

#[derive(Debug, Deserialize)]
struct StringParams {
    factory_address: String,
    #[serde(default)]
    generation: SchemaGeneration,
    #[serde(default)]
    activity_keys: ActivityKeyScheme,
}

impl StringParams {
    fn parse(input: &str) -> anyhow::Result<Self> {
        serde_qs::from_str(input).map_err(|e| anyhow!("Failed to parse query params: {}", e))
    }
}

/// Module parameters, e.g. `factory_address=0xab..,0xcd..&generation=named_streams`.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    pub factories: Vec<Vec<u8>>,
    pub generation: SchemaGeneration,
    pub activity_keys: ActivityKeyScheme,
}

pub fn decode_addr(s: &str) -> anyhow::Result<Vec<u8>> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.len() != 40 {
        return Err(anyhow!("address must be 20 bytes (40 hex chars), got len={}", s.len()));
    }
    Ok(hex::decode(s)?)
}

pub fn decode_addrs(s: &str) -> anyhow::Result<Vec<Vec<u8>>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(decode_addr)
        .collect()
}

impl Params {
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        let params = StringParams::parse(input)?;
        let factories = decode_addrs(&params.factory_address)?;
        if factories.is_empty() {
            return Err(anyhow!("at least one factory_address is required"));
        }

        Ok(Self { factories, generation: params.generation, activity_keys: params.activity_keys })
    }

    pub fn policy(&self) -> SchemaPolicy {
        SchemaPolicy::new(self.generation, self.activity_keys)
    }
}
