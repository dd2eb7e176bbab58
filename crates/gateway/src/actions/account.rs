//! Account handlers: Hive's own tenant surface, rendered with the IAM
//! envelope.

use std::sync::Arc;

use hive_types::api::account::*;
use hive_types::error::ApiError;
use hive_types::iam::{AccountRecord, AccountStatus};

use super::required;
use crate::auth::AuthContext;
use crate::dispatch::ServiceDispatcher;
use crate::AppState;

/// Wires up the account registry.
pub(crate) fn register(d: &mut ServiceDispatcher) {
    d.register("CreateAccount", create_account);
    d.register("GetAccount", get_account);
    d.register("ListAccounts", list_accounts);
}

fn account_shape(record: &AccountRecord) -> AccountSummary {
    AccountSummary {
        account_id: Some(record.account_id.clone()),
        name: Some(record.name.clone()),
        status: Some(
            match record.status {
                AccountStatus::Active => "Active",
                AccountStatus::Suspended => "Suspended",
            }
            .to_string(),
        ),
        create_date: Some(record.created_at),
    }
}

async fn create_account(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: CreateAccountInput,
) -> Result<CreateAccountOutput, ApiError> {
    let name = required(input.account_name, "AccountName")?;
    let record = state.iam.create_account(&name).await?;
    Ok(CreateAccountOutput {
        account: Some(account_shape(&record)),
    })
}

async fn get_account(
    state: Arc<AppState>,
    ctx: AuthContext,
    input: GetAccountInput,
) -> Result<GetAccountOutput, ApiError> {
    let account_id = input.account_id.unwrap_or_else(|| ctx.account_id.clone());
    let record = state.iam.get_account(&account_id).await?;
    Ok(GetAccountOutput {
        account: Some(account_shape(&record)),
    })
}

async fn list_accounts(
    state: Arc<AppState>,
    _ctx: AuthContext,
    _input: ListAccountsInput,
) -> Result<ListAccountsOutput, ApiError> {
    let records = state.iam.list_accounts().await?;
    Ok(ListAccountsOutput {
        accounts: records.iter().map(account_shape).collect(),
        is_truncated: false,
    })
}
