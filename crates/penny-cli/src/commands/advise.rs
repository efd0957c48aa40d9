//! Advisory request command

use std::sync::Arc;

use anyhow::{Context, Result};
use penny_core::{
    AdviceRequest, AdvisorConfig, AdvisoryOutcome, AdvisoryResponse, BudgetAdvisor, Database,
    PrivacyMode,
};

/// Build an advisory request from command-line arguments
pub fn build_request(
    month: Option<u32>,
    year: Option<i32>,
    question: Option<&str>,
    privacy: PrivacyMode,
) -> AdviceRequest {
    AdviceRequest {
        question: question
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(String::from),
        month: month.map(i64::from),
        year: year.map(i64::from),
        privacy,
    }
}

pub async fn cmd_advise(
    db: Database,
    config: &AdvisorConfig,
    user: &str,
    request: AdviceRequest,
    json: bool,
) -> Result<()> {
    let advisor = BudgetAdvisor::from_config(Arc::new(db), config);

    if !json {
        if advisor.generative_enabled() {
            println!("🤖 Asking {}...", config.model);
        } else {
            println!("📐 Using heuristic advisor (set PENNY_MODEL_TOKEN for the hosted model)");
        }
    }

    let (response, outcome) = advisor
        .advise(user, request)
        .await
        .context("Failed to build advice")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", render_response(&response, outcome));
    }

    Ok(())
}

/// Human-readable rendering of an advisory response
pub fn render_response(response: &AdvisoryResponse, outcome: AdvisoryOutcome) -> String {
    let advice = &response.advice;
    let mut out = String::new();

    out.push('\n');
    out.push_str(&format!(
        "💡 Budget advice for {:04}-{:02}\n",
        response.context_hints.year, response.context_hints.month
    ));
    out.push_str("   ─────────────────────────────────────────────────────────────\n");
    out.push_str(&format!(
        "   Model: {} (confidence {:.0}%)\n",
        response.model_identifier,
        advice.confidence * 100.0
    ));
    if outcome == AdvisoryOutcome::ReturnedHeuristicFallback {
        out.push_str("   ⚠️  Hosted model failed, showing heuristic advice instead\n");
    }

    section(&mut out, "Insights", &advice.insights);

    if !advice.suggested_budget_changes.is_empty() {
        out.push_str("\n   Suggested budget changes:\n");
        for s in &advice.suggested_budget_changes {
            out.push_str(&format!(
                "   • {} → {:.2}/month\n     {}\n",
                s.category_name, s.target_monthly_amount, s.rationale
            ));
        }
    }

    section(&mut out, "Tips", &advice.tips);
    section(&mut out, "Questions to consider", &advice.follow_ups);
    section(&mut out, "Assumptions", &advice.assumptions);

    out
}

fn section(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n   {}:\n", title));
    for item in items {
        out.push_str(&format!("   • {}\n", item));
    }
}
