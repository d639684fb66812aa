#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;

use const_format::concatcp;
use cosmwasm_std::{
    to_json_binary, Binary, BlockInfo, Deps, DepsMut, Env, Event, MessageInfo, Response,
    Storage,
};
use cw2::set_contract_version;

use twap::helper::EventExt;
use twap::oracle::{
    Config, ExecuteMsg, InstantiateMsg, MigrateMsg, PruningState, QueryMsg, SudoMsg,
};
use twap::pool_manager::PoolManagerQuerier;
use twap::{TwapRecord, ValidationError};

use crate::error::ContractError;
use crate::hooks::{after_epoch_end, after_pool_created, end_block, track_changed_pool};
use crate::logic::get_most_recent_record;
use crate::query::{
    get_arithmetic_twap, get_arithmetic_twap_to_now, get_geometric_twap,
    get_geometric_twap_to_now,
};
use crate::state::{
    get_all_most_recent_records_for_pool, get_pruning_state, get_record_at_or_before_time,
    store_historical_record, CONFIG, MOST_RECENT_RECORDS, PARAMS, PRUNING_STATE,
};

/// Contract name that is used for migration.
pub const CONTRACT_NAME: &str = "twap-oracle";
/// Contract version that is used for migration.
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub type ContractResult<T> = Result<T, ContractError>;

// ----------------x----------------x----------------x----------------x----------------x----------------
// ----------------x----------------x      Instantiate Contract : Execute function     x----------------
// ----------------x----------------x----------------x----------------x----------------x----------------

/// ## Description
/// Creates a new contract with the specified parameters in [`InstantiateMsg`].
/// Records passed in `twaps` are imported as they are, e.g. when the oracle state is moved
/// from another deployment.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> ContractResult<Response> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    msg.params.validate()?;
    let config = Config {
        owner: deps.api.addr_validate(&msg.owner)?,
        pool_manager: deps.api.addr_validate(&msg.pool_manager)?,
    };

    CONFIG.save(deps.storage, &config)?;
    PARAMS.save(deps.storage, &msg.params)?;
    PRUNING_STATE.save(deps.storage, &PruningState::default())?;
    import_twaps(deps.storage, &env.block, &msg.twaps)?;

    Ok(Response::new().add_event(
        Event::from_info(concatcp!(CONTRACT_NAME, "::instantiate"), &info)
            .add_attribute("owner", config.owner.to_string())
            .add_attribute("pool_manager", config.pool_manager.to_string())
            .add_attribute("prune_epoch_identifier", msg.params.prune_epoch_identifier)
            .add_attribute(
                "record_history_keep_period",
                msg.params.record_history_keep_period.to_string(),
            )
            .add_attribute("records_imported", msg.twaps.len().to_string()),
    ))
}

/// Writes every record to the historical index; the most recent index keeps the newest
/// record of each series. Records from after the current block are rejected.
fn import_twaps(
    storage: &mut dyn Storage,
    block: &BlockInfo,
    twaps: &[TwapRecord],
) -> ContractResult<()> {
    for record in twaps {
        record.validate()?;
        if record.time > block.time || record.height > block.height {
            return Err(ValidationError::InvalidRecord {
                pool_id: record.pool_id,
                reason: format!(
                    "record at height {} and time {} is newer than the current block",
                    record.height, record.time
                ),
            }
            .into());
        }
        store_historical_record(storage, record)?;

        let key = (record.pool_id, record.asset0_denom.as_str(), record.asset1_denom.as_str());
        let is_newest = match MOST_RECENT_RECORDS.may_load(storage, key)? {
            Some(current) => record.time >= current.time,
            None => true,
        };
        if is_newest {
            MOST_RECENT_RECORDS.save(storage, key, record)?;
        }
    }
    Ok(())
}

// ----------------x----------------x----------------x------------------x----------------x----------------
// ----------------x----------------x  Execute function :: Entry Point  x----------------x----------------
// ----------------x----------------x----------------x------------------x----------------x----------------

/// ## Description
/// Exposes the pool hooks and config updates.
///
/// * **ExecuteMsg::AfterPoolCreated { pool_id }** Creates the initial records of the pool.
///
/// * **ExecuteMsg::AfterSwap { pool_id }**, **ExecuteMsg::AfterJoinPool { pool_id }** Mark the
/// pool as changed so its records are refreshed at end block.
///
/// * **ExecuteMsg::AfterExitPool { pool_id }** Does nothing.
///
/// * **ExecuteMsg::UpdateConfig { owner, pool_manager }** Updates the [`Config`].
///
/// ## Executor
/// Hooks can only be called by the pool manager, config updates only by the owner.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> ContractResult<Response> {
    let config = CONFIG.load(deps.storage)?;

    match msg {
        ExecuteMsg::AfterPoolCreated { pool_id } => {
            ensure_pool_manager(&config, &info)?;
            let pool_manager = PoolManagerQuerier::new(deps.querier, config.pool_manager);
            let records = after_pool_created(deps.storage, &pool_manager, &env.block, pool_id)?;

            Ok(Response::new().add_event(
                Event::from_info(concatcp!(CONTRACT_NAME, "::after_pool_created"), &info)
                    .add_attribute("pool_id", pool_id.to_string())
                    .add_attribute("records_created", records.len().to_string()),
            ))
        }
        ExecuteMsg::AfterSwap { pool_id } => {
            ensure_pool_manager(&config, &info)?;
            track_changed_pool(deps.storage, pool_id)?;
            Ok(Response::new().add_event(
                Event::from_info(concatcp!(CONTRACT_NAME, "::after_swap"), &info)
                    .add_attribute("pool_id", pool_id.to_string()),
            ))
        }
        ExecuteMsg::AfterJoinPool { pool_id } => {
            ensure_pool_manager(&config, &info)?;
            track_changed_pool(deps.storage, pool_id)?;
            Ok(Response::new().add_event(
                Event::from_info(concatcp!(CONTRACT_NAME, "::after_join_pool"), &info)
                    .add_attribute("pool_id", pool_id.to_string()),
            ))
        }
        ExecuteMsg::AfterExitPool { .. } => {
            ensure_pool_manager(&config, &info)?;
            Ok(Response::default())
        }
        ExecuteMsg::UpdateConfig {
            owner,
            pool_manager,
        } => update_config(deps, info, config, owner, pool_manager),
    }
}

fn ensure_pool_manager(config: &Config, info: &MessageInfo) -> ContractResult<()> {
    if info.sender != config.pool_manager {
        return Err(ContractError::Unauthorized);
    }
    Ok(())
}

/// ## Description
/// Updates the owner and/or the pool manager.
///
/// ## Executor
/// Only the owner can execute this.
fn update_config(
    deps: DepsMut,
    info: MessageInfo,
    mut config: Config,
    owner: Option<String>,
    pool_manager: Option<String>,
) -> ContractResult<Response> {
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let mut event = Event::from_info(concatcp!(CONTRACT_NAME, "::update_config"), &info);
    if let Some(owner) = owner {
        config.owner = deps.api.addr_validate(&owner)?;
        event = event.add_attribute("owner", owner);
    }
    if let Some(pool_manager) = pool_manager {
        config.pool_manager = deps.api.addr_validate(&pool_manager)?;
        event = event.add_attribute("pool_manager", pool_manager);
    }
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_event(event))
}

// ----------------x----------------x----------------x------------------x----------------x----------------
// ----------------x----------------x  Sudo function :: Entry Point     x----------------x----------------
// ----------------x----------------x----------------x------------------x----------------x----------------

/// ## Description
/// Block and epoch lifecycle, called by the chain.
///
/// * **SudoMsg::EndBlock {}** Refreshes the records of every pool changed in this block, then
/// runs a pruning pass if a pruning run is in progress.
///
/// * **SudoMsg::AfterEpochEnd { epoch_identifier }** Starts a pruning run when the prune epoch ends.
///
/// * **SudoMsg::UpdateParams { params }** Replaces the module [`Params`].
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn sudo(deps: DepsMut, env: Env, msg: SudoMsg) -> ContractResult<Response> {
    match msg {
        SudoMsg::EndBlock {} => sudo_end_block(deps, env),
        SudoMsg::AfterEpochEnd { epoch_identifier } => {
            let mut event = Event::from_sudo(concatcp!(CONTRACT_NAME, "::after_epoch_end"))
                .add_attribute("epoch_identifier", epoch_identifier.clone());
            if let Some(state) = after_epoch_end(deps.storage, env.block.time, &epoch_identifier)? {
                event = event
                    .add_attribute("pruning_started", "true")
                    .add_attribute("last_kept_time", state.last_kept_time.to_string())
                    .add_attribute("last_seen_pool_id", state.last_seen_pool_id.to_string());
            }
            Ok(Response::new().add_event(event))
        }
        SudoMsg::UpdateParams { params } => {
            params.validate()?;
            PARAMS.save(deps.storage, &params)?;
            Ok(Response::new().add_event(
                Event::from_sudo(concatcp!(CONTRACT_NAME, "::update_params"))
                    .add_attribute("prune_epoch_identifier", params.prune_epoch_identifier)
                    .add_attribute(
                        "record_history_keep_period",
                        params.record_history_keep_period.to_string(),
                    ),
            ))
        }
    }
}

fn sudo_end_block(deps: DepsMut, env: Env) -> ContractResult<Response> {
    let config = CONFIG.load(deps.storage)?;
    let pool_manager = PoolManagerQuerier::new(deps.querier, config.pool_manager);
    let report = end_block(deps.storage, &pool_manager, &env.block)?;

    let mut event = Event::from_sudo(concatcp!(CONTRACT_NAME, "::end_block"))
        .add_attribute("height", env.block.height.to_string())
        .add_attribute("updated_pools", report.updated_pools.len().to_string());

    for (pool_id, err) in report.failed_pools.iter() {
        deps.api.debug(&format!(
            "twap: failed to update records of pool {} at height {}: {}",
            pool_id, env.block.height, err
        ));
        event = event.add_attribute("update_failed", format!("{}: {}", pool_id, err));
    }

    if let Some(pruning) = report.pruning {
        event = event
            .add_attribute("records_pruned", pruning.pruned.to_string())
            .add_attribute("pruning_finished", pruning.finished.to_string());
        for (pool_id, err) in pruning.failed_pools.iter() {
            deps.api.debug(&format!(
                "twap: failed to prune records of pool {}: {}",
                pool_id, err
            ));
            event = event.add_attribute("prune_failed", format!("{}: {}", pool_id, err));
        }
    }

    Ok(Response::new().add_event(event))
}

// ----------------x----------------x----------------x------------------x----------------x----------------
// ----------------x----------------x  Query function :: Entry Point    x----------------x----------------
// ----------------x----------------x----------------x------------------x----------------x----------------

/// ## Description
/// Exposes the twap queries and the stored state.
/// Internal consistency failures are written to the debug log before being returned.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> ContractResult<Binary> {
    let res = query_state(deps, env, msg);
    if let Err(err @ ContractError::RecordMismatch { .. }) = &res {
        deps.api.debug(&format!("twap: {}", err));
    }
    res
}

fn query_state(deps: Deps, env: Env, msg: QueryMsg) -> ContractResult<Binary> {
    let now = env.block.time;
    let result = match msg {
        QueryMsg::ArithmeticTwap {
            pool_id,
            base_asset,
            quote_asset,
            start_time,
            end_time,
        } => to_json_binary(&get_arithmetic_twap(
            deps.storage,
            now,
            pool_id,
            &base_asset,
            &quote_asset,
            start_time,
            end_time,
        )?),
        QueryMsg::ArithmeticTwapToNow {
            pool_id,
            base_asset,
            quote_asset,
            start_time,
        } => to_json_binary(&get_arithmetic_twap_to_now(
            deps.storage,
            now,
            pool_id,
            &base_asset,
            &quote_asset,
            start_time,
        )?),
        QueryMsg::GeometricTwap {
            pool_id,
            base_asset,
            quote_asset,
            start_time,
            end_time,
        } => to_json_binary(&get_geometric_twap(
            deps.storage,
            now,
            pool_id,
            &base_asset,
            &quote_asset,
            start_time,
            end_time,
        )?),
        QueryMsg::GeometricTwapToNow {
            pool_id,
            base_asset,
            quote_asset,
            start_time,
        } => to_json_binary(&get_geometric_twap_to_now(
            deps.storage,
            now,
            pool_id,
            &base_asset,
            &quote_asset,
            start_time,
        )?),
        QueryMsg::Config {} => to_json_binary(&CONFIG.load(deps.storage)?),
        QueryMsg::Params {} => to_json_binary(&PARAMS.load(deps.storage)?),
        QueryMsg::PruningState {} => to_json_binary(&get_pruning_state(deps.storage)?),
        QueryMsg::MostRecentRecord {
            pool_id,
            asset_a,
            asset_b,
        } => to_json_binary(&get_most_recent_record(
            deps.storage,
            now,
            pool_id,
            &asset_a,
            &asset_b,
        )?),
        QueryMsg::AllMostRecentRecords { pool_id } => {
            to_json_binary(&get_all_most_recent_records_for_pool(deps.storage, pool_id)?)
        }
        QueryMsg::RecordAtOrBeforeTime {
            pool_id,
            asset_a,
            asset_b,
            time,
        } => to_json_binary(&get_record_at_or_before_time(
            deps.storage,
            pool_id,
            time,
            &asset_a,
            &asset_b,
        )?),
    };

    result.map_err(ContractError::from)
}

// ----------------x----------------x----------------x------------------x----------------x----------------
// ----------------x----------------x  Migrate function :: Entry Point  x----------------x----------------
// ----------------x----------------x----------------x------------------x----------------x----------------

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> ContractResult<Response> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    Ok(Response::new().add_event(
        Event::new(concatcp!(CONTRACT_NAME, "::migrate"))
            .add_attribute("contract_version", CONTRACT_VERSION),
    ))
}
