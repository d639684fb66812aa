#![allow(dead_code)]

use cosmwasm_schema::cw_serde;
use cosmwasm_std::testing::mock_env;
use cosmwasm_std::{
    to_json_binary, Addr, Binary, Decimal256, Deps, DepsMut, Env, MessageInfo, Response, StdError,
    StdResult, Timestamp, WasmMsg,
};
use cw_multi_test::{App, AppResponse, ContractWrapper, Executor};
use cw_storage_plus::{Item, Map};
use twap::oracle::{ExecuteMsg, InstantiateMsg, Params, QueryMsg, SudoMsg, TwapResponse};
use twap::pool_manager::{PoolDenomsResponse, PoolManagerQueryMsg, SpotPriceResponse};

pub const EPOCH_START: u64 = 1_700_000_000;
/// Seconds between two blocks
pub const BLOCK_TIME: u64 = 5;

pub fn mock_app() -> App {
    let mut env = mock_env();
    env.block.time = Timestamp::from_seconds(EPOCH_START);

    let mut app = App::default();
    app.set_block(env.block);
    app
}

/// Moves the app to the next block.
pub fn next_block(app: &mut App) {
    app.update_block(|block| {
        block.height += 1;
        block.time = block.time.plus_seconds(BLOCK_TIME);
    });
}

/// Runs end block on the oracle, then moves to the next block.
pub fn end_block(app: &mut App, oracle: &Addr) -> AppResponse {
    let res = app.wasm_sudo(oracle.clone(), &SudoMsg::EndBlock {}).unwrap();
    next_block(app);
    res
}

// ----------------x----------------x----------------x----------------x----------------x----------------
// ----------------x----------------x    Mock pool manager contract      x----------------x-------------
// ----------------x----------------x----------------x----------------x----------------x----------------

/// Value of every asset of a pool in a common unit. The spot price of `base` in `quote`
/// is `value(base) / value(quote)`.
const POOLS: Map<u64, Vec<(String, Decimal256)>> = Map::new("pools");
const DRAINED_POOLS: Map<u64, bool> = Map::new("drained_pools");
const ORACLE: Item<Addr> = Item::new("oracle");

#[cw_serde]
pub struct MockInstantiateMsg {}

#[cw_serde]
pub enum MockExecuteMsg {
    SetOracle {
        oracle: String,
    },
    CreatePool {
        pool_id: u64,
        assets: Vec<(String, Decimal256)>,
    },
    /// Sets the value of one asset and reports a swap to the oracle
    Swap {
        pool_id: u64,
        denom: String,
        value: Decimal256,
    },
    JoinPool {
        pool_id: u64,
    },
    ExitPool {
        pool_id: u64,
    },
    /// Spot prices of the pool fail from now on
    Drain {
        pool_id: u64,
    },
}

fn hook(deps: Deps, msg: &ExecuteMsg) -> StdResult<WasmMsg> {
    Ok(WasmMsg::Execute {
        contract_addr: ORACLE.load(deps.storage)?.to_string(),
        msg: to_json_binary(msg)?,
        funds: vec![],
    })
}

fn mock_instantiate(
    _deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    _msg: MockInstantiateMsg,
) -> StdResult<Response> {
    Ok(Response::default())
}

fn mock_execute(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: MockExecuteMsg,
) -> StdResult<Response> {
    match msg {
        MockExecuteMsg::SetOracle { oracle } => {
            ORACLE.save(deps.storage, &deps.api.addr_validate(&oracle)?)?;
            Ok(Response::default())
        }
        MockExecuteMsg::CreatePool { pool_id, assets } => {
            POOLS.save(deps.storage, pool_id, &assets)?;
            let msg = hook(deps.as_ref(), &ExecuteMsg::AfterPoolCreated { pool_id })?;
            Ok(Response::new().add_message(msg))
        }
        MockExecuteMsg::Swap {
            pool_id,
            denom,
            value,
        } => {
            POOLS.update(deps.storage, pool_id, |assets| -> StdResult<_> {
                let mut assets = assets.ok_or_else(|| StdError::not_found("pool"))?;
                for asset in assets.iter_mut().filter(|(d, _)| *d == denom) {
                    asset.1 = value;
                }
                Ok(assets)
            })?;
            let msg = hook(deps.as_ref(), &ExecuteMsg::AfterSwap { pool_id })?;
            Ok(Response::new().add_message(msg))
        }
        MockExecuteMsg::JoinPool { pool_id } => {
            let msg = hook(deps.as_ref(), &ExecuteMsg::AfterJoinPool { pool_id })?;
            Ok(Response::new().add_message(msg))
        }
        MockExecuteMsg::ExitPool { pool_id } => {
            let msg = hook(deps.as_ref(), &ExecuteMsg::AfterExitPool { pool_id })?;
            Ok(Response::new().add_message(msg))
        }
        MockExecuteMsg::Drain { pool_id } => {
            DRAINED_POOLS.save(deps.storage, pool_id, &true)?;
            Ok(Response::default())
        }
    }
}

fn asset_value(assets: &[(String, Decimal256)], denom: &str) -> StdResult<Decimal256> {
    assets
        .iter()
        .find(|(d, _)| d == denom)
        .map(|(_, value)| *value)
        .ok_or_else(|| StdError::not_found(denom))
}

fn mock_query(deps: Deps, _env: Env, msg: PoolManagerQueryMsg) -> StdResult<Binary> {
    match msg {
        PoolManagerQueryMsg::PoolDenoms { pool_id } => {
            let assets = POOLS.load(deps.storage, pool_id)?;
            to_json_binary(&PoolDenomsResponse {
                denoms: assets.into_iter().map(|(denom, _)| denom).collect(),
            })
        }
        PoolManagerQueryMsg::SpotPrice {
            pool_id,
            base_asset_denom,
            quote_asset_denom,
        } => {
            if DRAINED_POOLS.has(deps.storage, pool_id) {
                return Err(StdError::generic_err("pool has no liquidity"));
            }
            let assets = POOLS.load(deps.storage, pool_id)?;
            let spot_price = asset_value(&assets, &base_asset_denom)?
                .checked_div(asset_value(&assets, &quote_asset_denom)?)
                .map_err(|e| StdError::generic_err(e.to_string()))?;
            to_json_binary(&SpotPriceResponse { spot_price })
        }
    }
}

// ----------------x----------------x----------------x----------------x----------------x----------------
// ----------------x----------------x    Store and instantiate helpers      x----------------x----------
// ----------------x----------------x----------------x----------------x----------------x----------------

pub fn store_pool_manager_code(app: &mut App) -> u64 {
    let pool_manager_contract = Box::new(ContractWrapper::new_with_empty(
        mock_execute,
        mock_instantiate,
        mock_query,
    ));
    app.store_code(pool_manager_contract)
}

pub fn store_oracle_code(app: &mut App) -> u64 {
    let oracle_contract = Box::new(
        ContractWrapper::new_with_empty(
            twap_oracle::contract::execute,
            twap_oracle::contract::instantiate,
            twap_oracle::contract::query,
        )
        .with_sudo_empty(twap_oracle::contract::sudo),
    );
    app.store_code(oracle_contract)
}

/// Instantiates the mock pool manager and the oracle wired to it.
/// Returns (pool manager, oracle).
pub fn instantiate_contracts(app: &mut App, owner: &Addr, params: Params) -> (Addr, Addr) {
    let pool_manager_code_id = store_pool_manager_code(app);
    let oracle_code_id = store_oracle_code(app);

    let pool_manager = app
        .instantiate_contract(
            pool_manager_code_id,
            owner.clone(),
            &MockInstantiateMsg {},
            &[],
            "pool_manager",
            None,
        )
        .unwrap();

    let oracle = app
        .instantiate_contract(
            oracle_code_id,
            owner.clone(),
            &InstantiateMsg {
                owner: owner.to_string(),
                pool_manager: pool_manager.to_string(),
                params,
                twaps: vec![],
            },
            &[],
            "twap_oracle",
            None,
        )
        .unwrap();

    app.execute_contract(
        owner.clone(),
        pool_manager.clone(),
        &MockExecuteMsg::SetOracle {
            oracle: oracle.to_string(),
        },
        &[],
    )
    .unwrap();

    (pool_manager, oracle)
}

pub fn create_pool(app: &mut App, pool_manager: &Addr, pool_id: u64, assets: &[(&str, &str)]) {
    let assets = assets
        .iter()
        .map(|(denom, value)| (denom.to_string(), value.parse::<Decimal256>().unwrap()))
        .collect();
    app.execute_contract(
        Addr::unchecked("creator"),
        pool_manager.clone(),
        &MockExecuteMsg::CreatePool { pool_id, assets },
        &[],
    )
    .unwrap();
}

pub fn swap(app: &mut App, pool_manager: &Addr, pool_id: u64, denom: &str, value: &str) {
    app.execute_contract(
        Addr::unchecked("trader"),
        pool_manager.clone(),
        &MockExecuteMsg::Swap {
            pool_id,
            denom: denom.to_string(),
            value: value.parse().unwrap(),
        },
        &[],
    )
    .unwrap();
}

pub fn query_twap(app: &App, oracle: &Addr, msg: &QueryMsg) -> StdResult<TwapResponse> {
    app.wrap().query_wasm_smart(oracle.clone(), msg)
}
