use log::info;

use crate::blockchain::{Block, Chain, MiningOptions};
use crate::error::Result;

/// Payloads mined when none are given on the command line.
pub const SAMPLE_PAYLOADS: [&str; 4] = ["hello world", "what's up", "hello", "bye"];

/// Mine `payloads` in order with sequence numbers 1, 2, 3, ...
pub fn build_chain(
    payloads: &[String],
    difficulty: u32,
    options: &MiningOptions,
) -> Result<Chain<String>> {
    let mut chain = Chain::new(difficulty)?;
    for (num, data) in (1u64..).zip(payloads) {
        let block = Block::new(data.clone(), num);
        let rec = if options.is_unbounded() {
            chain.mine(block)
        } else {
            chain.mine_with(block, options)?
        };
        info!(
            "sealed block #{} (hash={}, nonce={})",
            rec.sequence_number, rec.digest, rec.nonce
        );
    }
    Ok(chain)
}

/// Records in chain order, either as text blocks or as a JSON array.
pub fn render(chain: &Chain<String>, json: bool) -> serde_json::Result<String> {
    if json {
        return serde_json::to_string_pretty(chain.records());
    }
    let blocks: Vec<String> = chain.records().iter().map(|rec| rec.to_string()).collect();
    Ok(blocks.join("\n\n"))
}
