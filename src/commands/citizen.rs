use crate::commands::{describe, AppContext};
use crate::domain::models::{ApplicationSubmission, View};
use crate::services::output::{print_one, record_row};
use crate::services::policy::require_view;

pub struct SubmissionArgs {
    pub pan: String,
    pub bank_account: String,
    pub full_name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

pub async fn apply(ctx: &AppContext, args: SubmissionArgs) -> anyhow::Result<()> {
    require_view(View::Apply, &ctx.store)?;
    let pan = args.pan.trim().to_ascii_uppercase();
    if pan.is_empty() || args.bank_account.trim().is_empty() {
        anyhow::bail!("PAN and bank account are required");
    }
    let submission = ApplicationSubmission {
        pan_number: pan,
        target_bank_account: args.bank_account.trim().to_string(),
        full_name: args.full_name,
        age: args.age,
        gender: args.gender,
    };
    let receipt = ctx
        .client()?
        .submit_application(&submission)
        .await
        .map_err(describe)?;
    print_one(ctx.json, receipt, |r| {
        if r.message.is_empty() {
            "Application submitted successfully. Under verification.".to_string()
        } else {
            r.message.clone()
        }
    })
}

pub async fn status(ctx: &AppContext) -> anyhow::Result<()> {
    require_view(View::Status, &ctx.store)?;
    let record = ctx.client()?.my_application().await.map_err(describe)?;
    print_one(ctx.json, record, |r| match r {
        Some(rec) => record_row(rec),
        None => "No application found.".to_string(),
    })
}
