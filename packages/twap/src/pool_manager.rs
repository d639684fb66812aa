use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{to_json_binary, Addr, Decimal256, QuerierWrapper, QueryRequest, StdResult, WasmQuery};

/// ## Description
/// The capability the oracle needs from the AMM: which denoms a pool holds and
/// what the current spot price between two of them is.
pub trait PoolManager {
    /// All denoms of the pool.
    fn pool_denoms(&self, pool_id: u64) -> StdResult<Vec<String>>;

    /// Price of one unit of `base_asset_denom`, expressed in `quote_asset_denom`.
    fn spot_price(
        &self,
        pool_id: u64,
        base_asset_denom: &str,
        quote_asset_denom: &str,
    ) -> StdResult<Decimal256>;
}

// ----------------x----------------x----------------x----------------x----------------x----------------
// ----------------x----------------x    Pool manager contract queries      x----------------x----------
// ----------------x----------------x----------------x----------------x----------------x----------------

/// Queries the oracle sends to the pool manager contract.
#[cw_serde]
#[derive(QueryResponses)]
pub enum PoolManagerQueryMsg {
    #[returns(PoolDenomsResponse)]
    PoolDenoms { pool_id: u64 },

    #[returns(SpotPriceResponse)]
    SpotPrice {
        pool_id: u64,
        base_asset_denom: String,
        quote_asset_denom: String,
    },
}

#[cw_serde]
pub struct PoolDenomsResponse {
    pub denoms: Vec<String>,
}

#[cw_serde]
pub struct SpotPriceResponse {
    pub spot_price: Decimal256,
}

/// ## Description
/// [`PoolManager`] backed by smart queries against the pool manager contract.
pub struct PoolManagerQuerier<'a> {
    querier: QuerierWrapper<'a>,
    pool_manager: Addr,
}

impl<'a> PoolManagerQuerier<'a> {
    pub fn new(querier: QuerierWrapper<'a>, pool_manager: Addr) -> Self {
        PoolManagerQuerier {
            querier,
            pool_manager,
        }
    }

    fn query<T: serde::de::DeserializeOwned>(&self, msg: &PoolManagerQueryMsg) -> StdResult<T> {
        self.querier.query(&QueryRequest::Wasm(WasmQuery::Smart {
            contract_addr: self.pool_manager.to_string(),
            msg: to_json_binary(msg)?,
        }))
    }
}

impl<'a> PoolManager for PoolManagerQuerier<'a> {
    fn pool_denoms(&self, pool_id: u64) -> StdResult<Vec<String>> {
        let res: PoolDenomsResponse = self.query(&PoolManagerQueryMsg::PoolDenoms { pool_id })?;
        Ok(res.denoms)
    }

    fn spot_price(
        &self,
        pool_id: u64,
        base_asset_denom: &str,
        quote_asset_denom: &str,
    ) -> StdResult<Decimal256> {
        let res: SpotPriceResponse = self.query(&PoolManagerQueryMsg::SpotPrice {
            pool_id,
            base_asset_denom: base_asset_denom.to_string(),
            quote_asset_denom: quote_asset_denom.to_string(),
        })?;
        Ok(res.spot_price)
    }
}
