use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::{pow, Block, Ledger, LedgerError, Transaction};

/// Data structure for the shared ledger state
pub type LedgerData = web::Data<Ledger>;

/// Process-wide node identifier, generated once at startup. Plumbing only:
/// it has no effect on ledger invariants.
#[derive(Debug, Clone)]
pub struct NodeIdentity(pub String);

/// Upper bound on nonces tried per mining request. The search itself is
/// unbounded by contract; this bound belongs to the request path, which
/// must not block forever.
const MAX_SEARCH_ATTEMPTS: u64 = 100_000_000;

/// Response for the chain endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// The length of the chain
    pub length: usize,

    /// The blocks in the chain
    pub chain: Vec<Block>,

    /// Whether the chain is valid
    pub is_valid: bool,
}

/// Request for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionRequest {
    /// The sender's address
    pub sender: String,

    /// The recipient's address
    pub recipient: String,

    /// The amount to transfer
    pub amount: u64,
}

/// Response for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    /// The message
    pub message: String,

    /// The index of the block that will include this transaction
    pub block_index: u64,
}

/// Response for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    /// The message
    pub message: String,

    /// The identifier of the node that sealed the block
    pub node_id: String,

    /// The newly sealed block
    pub block: Block,
}

/// Get the full chain
///
/// Returns the entire chain, its length and its validity status
#[utoipa::path(
    get,
    path = "/api/v1/chain",
    responses(
        (status = 200, description = "Chain retrieved successfully", body = ChainResponse)
    )
)]
pub async fn get_chain(ledger: LedgerData) -> impl Responder {
    let chain = ledger.snapshot();
    let is_valid = ledger.is_valid();

    let response = ChainResponse {
        length: chain.len(),
        chain,
        is_valid,
    };

    HttpResponse::Ok().json(response)
}

/// Get the last block
///
/// Returns the most recently appended block
#[utoipa::path(
    get,
    path = "/api/v1/last_block",
    responses(
        (status = 200, description = "Last block retrieved successfully", body = Block),
        (status = 500, description = "Ledger invariant violated")
    )
)]
pub async fn get_last_block(ledger: LedgerData) -> impl Responder {
    match ledger.tip() {
        Ok(block) => HttpResponse::Ok().json(block),
        Err(err) => {
            // Cannot happen through the ledger's own API; treat as fatal.
            error!("ledger invariant violated: {}", err);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("{}", err)
            }))
        }
    }
}

/// Get all pending transactions
///
/// Returns all transactions waiting to be sealed into a block
#[utoipa::path(
    get,
    path = "/api/v1/transactions/pending",
    responses(
        (status = 200, description = "Pending transactions retrieved successfully", body = Vec<Transaction>)
    )
)]
pub async fn get_pending_transactions(ledger: LedgerData) -> impl Responder {
    let transactions = ledger.pending_transactions();
    HttpResponse::Ok().json(transactions)
}

/// Create a new transaction
///
/// Adds a new transaction to the pending transactions
#[utoipa::path(
    post,
    path = "/api/v1/transactions/new",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction queued successfully", body = TransactionResponse)
    )
)]
pub async fn new_transaction(
    ledger: LedgerData,
    transaction_req: web::Json<TransactionRequest>,
) -> impl Responder {
    let transaction_req = transaction_req.into_inner();
    let transaction = Transaction::new(
        transaction_req.sender,
        transaction_req.recipient,
        transaction_req.amount,
    );

    let block_index = ledger.queue_transaction(transaction);

    let response = TransactionResponse {
        message: "Transaction will be added to Block".to_string(),
        block_index,
    };

    HttpResponse::Created().json(response)
}

/// Mine a new block
///
/// Searches for a valid proof against the current tip, then seals all
/// pending transactions into a new block. The search runs on the blocking
/// thread pool so the request thread is never pinned by the CPU-bound scan.
#[utoipa::path(
    get,
    path = "/api/v1/mine",
    responses(
        (status = 200, description = "Block sealed successfully", body = MineResponse),
        (status = 400, description = "Proof rejected at seal time"),
        (status = 503, description = "No proof found within the attempt bound"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn mine_block(ledger: LedgerData, node: web::Data<NodeIdentity>) -> impl Responder {
    let tip = match ledger.tip() {
        Ok(block) => block,
        Err(err) => {
            error!("ledger invariant violated: {}", err);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("{}", err)
            }));
        }
    };

    let difficulty = ledger.difficulty();
    let search = web::block(move || pow::search_bounded(&tip, difficulty, MAX_SEARCH_ATTEMPTS)).await;

    let nonce = match search {
        Ok(Ok(nonce)) => nonce,
        Ok(Err(err)) => {
            return HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": format!("{}", err)
            }));
        }
        Err(err) => {
            error!("proof-of-work task failed: {}", err);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "mining task failed"
            }));
        }
    };

    // The tip may have advanced while the search ran; seal_block re-validates
    // the nonce against the current tip and rejects a stale proof.
    match ledger.seal_block(nonce) {
        Ok(block) => {
            let response = MineResponse {
                message: "New Block Sealed".to_string(),
                node_id: node.0.clone(),
                block,
            };

            HttpResponse::Ok().json(response)
        }
        Err(err @ LedgerError::InvalidProof { .. }) => {
            HttpResponse::BadRequest().json(serde_json::json!({
                "error": format!("Failed to seal block: {}", err)
            }))
        }
        Err(err) => {
            error!("ledger invariant violated: {}", err);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("{}", err)
            }))
        }
    }
}

/// Check if the chain is valid
///
/// Validates the entire chain
#[utoipa::path(
    get,
    path = "/api/v1/validate",
    responses(
        (status = 200, description = "Chain validation status", body = bool)
    )
)]
pub async fn validate_chain(ledger: LedgerData) -> impl Responder {
    let is_valid = ledger.is_valid();
    HttpResponse::Ok().json(is_valid)
}
