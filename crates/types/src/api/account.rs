//! Account-service shapes. The account surface is Hive's own; it borrows
//! the IAM envelope conventions.

use chrono::{DateTime, Utc};
use hive_codec::aws_shape;

aws_shape! {
    /// One tenant account, as rendered in responses.
    pub struct AccountSummary {
        account_id: Option<String> => "AccountId",
        name: Option<String> => "Name",
        status: Option<String> => "Status",
        create_date: Option<DateTime<Utc>> => "CreateDate",
    }
}

aws_shape! {
    /// Parameters of `CreateAccount`.
    pub struct CreateAccountInput {
        account_name: Option<String> => "AccountName",
    }
}

aws_shape! {
    /// Result of `CreateAccount`.
    pub struct CreateAccountOutput {
        account: Option<AccountSummary> => "Account",
    }
}

aws_shape! {
    /// Parameters of `GetAccount`.
    pub struct GetAccountInput {
        account_id: Option<String> => "AccountId",
    }
}

aws_shape! {
    /// Result of `GetAccount`.
    pub struct GetAccountOutput {
        account: Option<AccountSummary> => "Account",
    }
}

aws_shape! {
    /// Parameters of `ListAccounts`.
    pub struct ListAccountsInput {
        marker: Option<String> => "Marker",
        max_items: Option<i64> => "MaxItems",
    }
}

aws_shape! {
    /// Result of `ListAccounts`.
    pub struct ListAccountsOutput {
        accounts: Vec<AccountSummary> => "Accounts",
        is_truncated: bool => "IsTruncated",
    }
}
