//! # Lifecycle Adapter
//!
//! Pure mapping from host request/response shapes into snapshot records.
//!
//! ## Encoding Rules
//!
//! | Source | Snapshot form |
//! |--------|---------------|
//! | header hashes, proposer address | lower-case hex |
//! | transaction hash | SHA-256 of the tx bytes, upper-case hex |
//! | validator addresses | bech32 with the configured operator prefix |
//! | block / misbehavior time | Unix seconds |
//! | evidence max-age duration | milliseconds |
//! | validator pubkey types | comma-joined |

use bech32::{ToBase32, Variant};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::domain::abci::{self, ConsensusParams, LastCommitInfo, RequestBeginBlock};
use crate::domain::call_frame::CallFrame;
use crate::domain::config::EventSequencing;
use crate::domain::metadata::{DeliveredTx, EndBlockRecord};
use crate::domain::snapshot::{
    Block, Event, EventAttribute, EvmCallTrace, Misbehavior, Transaction, ValidatorUpdate,
    VoteInfo,
};

/// Block height as the unsigned `seq` carried by every record.
pub fn height_seq(height: i64) -> u64 {
    height.max(0) as u64
}

/// CometBFT transaction hash: upper-case hex SHA-256 of the raw bytes.
pub fn tx_hash(tx: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(tx))
}

/// Renders validator addresses in the chain's operator-address format.
#[derive(Debug, Clone)]
pub struct ValidatorAddressCodec {
    prefix: String,
}

impl ValidatorAddressCodec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Bech32-encode `address`. An empty address renders as an empty string.
    pub fn format(&self, address: &[u8]) -> String {
        if address.is_empty() {
            return String::new();
        }
        bech32::encode(&self.prefix, address.to_base32(), Variant::Bech32).unwrap_or_else(|e| {
            warn!(prefix = %self.prefix, error = %e, "Validator address not bech32-encodable, using hex");
            hex::encode(address)
        })
    }
}

/// Hands out `seq` / `event_seq` values for events and attributes.
#[derive(Debug, Clone)]
pub struct EventSequencer {
    mode: EventSequencing,
    height: u64,
    next_event: u64,
    next_attribute: u64,
}

impl EventSequencer {
    pub fn new(mode: EventSequencing, height: u64) -> Self {
        Self {
            mode,
            height,
            next_event: 0,
            next_attribute: 0,
        }
    }

    fn event_seq(&mut self) -> u64 {
        match self.mode {
            EventSequencing::BlockHeight => self.height,
            EventSequencing::PerEvent => {
                let seq = self.next_event;
                self.next_event += 1;
                seq
            }
        }
    }

    fn attribute_seq(&mut self) -> u64 {
        match self.mode {
            EventSequencing::BlockHeight => self.height,
            EventSequencing::PerEvent => {
                let seq = self.next_attribute;
                self.next_attribute += 1;
                seq
            }
        }
    }

    /// Map a batch of host events and their attributes, in order.
    pub fn map_events(&mut self, events: &[abci::Event]) -> (Vec<Event>, Vec<EventAttribute>) {
        let mut mapped = Vec::with_capacity(events.len());
        let mut attributes = Vec::new();

        for event in events {
            let event_seq = self.event_seq();
            mapped.push(Event {
                seq: event_seq,
                event_type: event.kind.clone(),
            });
            for attribute in &event.attributes {
                attributes.push(EventAttribute {
                    seq: self.attribute_seq(),
                    event_seq,
                    key: attribute.key.clone(),
                    value: attribute.value.clone(),
                    index: attribute.index,
                });
            }
        }

        (mapped, attributes)
    }
}

/// Block record from the BeginBlock request and the EndBlock pair.
///
/// The block height (and `seq`) comes from the EndBlock request.
pub fn block_record(begin: &RequestBeginBlock, end: &EndBlockRecord) -> Block {
    let header = &begin.header;
    let mut block = Block {
        seq: height_seq(end.request.height),
        height: end.request.height,
        hash: hex::encode(&begin.hash),
        version_block: header.version.block,
        version_app: header.version.app,
        chain_id: header.chain_id.clone(),
        time: header.time.unix_seconds(),
        last_block_id_hash: hex::encode(&header.last_block_id.hash),
        last_block_id_part_set_header_total: header.last_block_id.part_set_header.total,
        last_block_id_part_set_header_hash: hex::encode(&header.last_block_id.part_set_header.hash),
        last_commit_hash: hex::encode(&header.last_commit_hash),
        data_hash: hex::encode(&header.data_hash),
        validators_hash: hex::encode(&header.validators_hash),
        next_validators_hash: hex::encode(&header.next_validators_hash),
        consensus_hash: hex::encode(&header.consensus_hash),
        app_hash: hex::encode(&header.app_hash),
        last_results_hash: hex::encode(&header.last_results_hash),
        evidence_hash: hex::encode(&header.evidence_hash),
        proposer_address: hex::encode(&header.proposer_address),
        last_commit_info_round: begin.last_commit_info.round,
        ..Default::default()
    };

    if let Some(params) = &end.response.consensus_param_updates {
        apply_consensus_param_updates(&mut block, params);
    }

    block
}

/// Copy consensus parameter updates into the block record.
///
/// Sections missing from the update leave their fields at zero.
pub fn apply_consensus_param_updates(block: &mut Block, params: &ConsensusParams) {
    if let Some(b) = &params.block {
        block.consensus_param_updates_block_max_bytes = b.max_bytes;
        block.consensus_param_updates_block_max_gas = b.max_gas;
    }
    if let Some(evidence) = &params.evidence {
        block.consensus_param_updates_evidence_max_age_num_blocks = evidence.max_age_num_blocks;
        block.consensus_param_updates_evidence_max_age_duration =
            i64::try_from(evidence.max_age_duration.as_millis()).unwrap_or(i64::MAX);
        block.consensus_param_updates_evidence_max_bytes = evidence.max_bytes;
    }
    if let Some(validator) = &params.validator {
        block.consensus_param_updates_validator_pub_key_types = validator.pub_key_types.join(",");
    }
    if let Some(version) = &params.version {
        block.consensus_param_updates_version_app = version.app;
    }
}

pub fn validator_updates(updates: &[abci::ValidatorUpdate], seq: u64) -> Vec<ValidatorUpdate> {
    updates
        .iter()
        .map(|update| ValidatorUpdate {
            seq,
            pub_key: update.pub_key.ed25519().map(<[u8]>::to_vec).unwrap_or_default(),
            power: update.power,
        })
        .collect()
}

pub fn vote_infos(
    commit: &LastCommitInfo,
    seq: u64,
    codec: &ValidatorAddressCodec,
) -> Vec<VoteInfo> {
    commit
        .votes
        .iter()
        .map(|vote| VoteInfo {
            seq,
            block_seq: seq,
            validator_address: codec.format(&vote.validator.address),
            validator_power: vote.validator.power,
            signed_last_block: vote.signed_last_block,
        })
        .collect()
}

pub fn misbehaviors(
    evidence: &[abci::Misbehavior],
    seq: u64,
    codec: &ValidatorAddressCodec,
) -> Vec<Misbehavior> {
    evidence
        .iter()
        .map(|m| Misbehavior {
            seq,
            block_seq: seq,
            typ: m.kind.to_string(),
            validator_power: m.validator.power,
            validator_address: codec.format(&m.validator.address),
            height: m.height,
            time: m.time.unix_seconds(),
            total_voting_power: m.total_voting_power,
        })
        .collect()
}

/// Transaction record for the `index`-th delivered transaction.
pub fn transaction(index: usize, delivered: &DeliveredTx, tx_hash: &str, seq: u64) -> Transaction {
    let response = &delivered.response;
    Transaction {
        seq,
        tx: delivered.request.tx.clone(),
        tx_hash: tx_hash.to_string(),
        tx_index: u32::try_from(index).unwrap_or(u32::MAX),
        code: response.code,
        data: response.data.clone(),
        log: response.log.clone(),
        info: response.info.clone(),
        gas_wanted: response.gas_wanted,
        gas_used: response.gas_used,
        codespace: response.codespace.clone(),
    }
}

/// Tag call frames with the owning transaction hash.
pub fn call_traces<'a>(
    tx_hash: &str,
    frames: impl IntoIterator<Item = &'a CallFrame>,
    block_index: i64,
) -> Vec<EvmCallTrace> {
    frames
        .into_iter()
        .map(|call| EvmCallTrace {
            tx_hash: tx_hash.to_string(),
            tx_index: call.tx_index,
            block_index,
            depth: call.depth,
            call_type: call.call_type.clone(),
            from: call.from.clone(),
            to: call.to.clone(),
            value: call.value.clone(),
            gas_limit: call.gas,
            gas_used: call.gas_used,
            input: call.input.clone(),
            output: call.output.clone(),
            error: call.error.clone(),
            revert_reason: call.revert_reason.clone(),
        })
        .collect()
}
