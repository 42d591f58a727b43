use serde_json::{json, Value};
use tracing::info;

use super::report::{CheckResult, RunReport, SuiteReport};
use super::schema::{validate_product_shape, validate_product_types};
use super::Suite;
use crate::catalog::fixtures;
use crate::catalog::{
    NewProduct, Product, CONTENT_TYPE_JSON, STATUS_BAD_REQUEST, STATUS_METHOD_NOT_ALLOWED,
    STATUS_NOT_FOUND, STATUS_OK, TEXT_INVALID_ID,
};
use crate::client::{ApiResponse, CatalogClient, Payload};
use crate::config::Config;
use crate::error::Result;
use crate::load::{LoadHarness, LoadPlan};

/// Minimum catalog sizes the listing must satisfy.
pub const LIST_MINIMUMS: [usize; 3] = [5, 10, 20];

pub async fn run_suites(suites: &[Suite], client: &CatalogClient, cfg: &Config) -> Result<RunReport> {
    let mut report = RunReport::default();
    for suite in suites {
        report.suites.push(run_suite(*suite, client, cfg).await?);
    }
    Ok(report)
}

/// Runs one suite. Only configuration problems surface as `Err`; failed
/// requests and assertions are recorded as failed checks.
pub async fn run_suite(suite: Suite, client: &CatalogClient, cfg: &Config) -> Result<SuiteReport> {
    info!(%suite, "running suite");
    let report = match suite {
        Suite::GetProduct => check_get_product(client, cfg).await,
        Suite::CreateProduct => check_create_product(client).await,
        Suite::DeleteProduct => check_delete_product(client, cfg).await,
        Suite::ListProducts => check_list_products(client).await,
        Suite::Load => check_load(cfg).await?,
    };
    let (passed, failed) = report.counts();
    info!(%suite, passed, failed, "suite finished");
    Ok(report)
}

fn request_failed(name: String, err: impl std::fmt::Display) -> CheckResult {
    CheckResult::fail(name, format!("request failed: {err}"))
}

fn content_type_check(name: String, resp: &ApiResponse) -> CheckResult {
    match resp.content_type.as_deref() {
        Some(CONTENT_TYPE_JSON) => CheckResult::pass(name),
        other => CheckResult::fail(name, format!("expected `{CONTENT_TYPE_JSON}`, got {other:?}")),
    }
}

pub async fn check_get_product(client: &CatalogClient, cfg: &Config) -> SuiteReport {
    let mut report = SuiteReport::new(Suite::GetProduct);

    match client.product_ids(cfg.run.sample_percent).await {
        Ok(ids) => {
            for id in ids {
                report.extend(existing_product_checks(client, id).await);
            }
        }
        Err(err) => report.push(CheckResult::fail("fetch product ids", err.to_string())),
    }

    for id in fixtures::false_ids() {
        report.push(false_id_check(client, &id).await);
    }

    match client.product_ids(cfg.run.negative_sample_percent).await {
        Ok(ids) => {
            for id in ids {
                report.push(wrong_method_check(client, id).await);
            }
        }
        Err(err) => report.push(CheckResult::fail("fetch negative sample ids", err.to_string())),
    }

    report
}

async fn existing_product_checks(client: &CatalogClient, id: i64) -> Vec<CheckResult> {
    let prefix = format!("get_product[{id}]");
    let resp = match client.get_product(id).await {
        Ok(resp) => resp,
        Err(err) => return vec![request_failed(format!("{prefix} request"), err)],
    };

    let mut checks = vec![
        CheckResult::expect_status(format!("{prefix} status"), resp.status, &[STATUS_OK]),
        content_type_check(format!("{prefix} content type"), &resp),
    ];

    let body = match resp.json() {
        Ok(body) => body,
        Err(err) => {
            checks.push(CheckResult::fail(format!("{prefix} body"), err.to_string()));
            return checks;
        }
    };

    let mut structure = validate_product_shape(&body);
    if body.get("id").and_then(Value::as_i64) != Some(id) {
        structure.push(format!("expected id {id}, got {}", body["id"]));
    }
    checks.push(CheckResult::from_problems(format!("{prefix} structure"), structure));
    checks.push(CheckResult::from_problems(
        format!("{prefix} data types"),
        validate_product_types(&body),
    ));

    if let Some(image) = body.get("image").and_then(Value::as_str).filter(|u| u.starts_with("http")) {
        let name = format!("{prefix} image reachable");
        checks.push(match client.get_url(image).await {
            Ok(img) => CheckResult::expect_status(name, img.status, &[STATUS_OK]),
            Err(err) => request_failed(name, err),
        });
    }

    checks
}

async fn false_id_check(client: &CatalogClient, id: &str) -> CheckResult {
    let name = format!("get_product[{id}] rejected");
    let resp = match client.get_product(id).await {
        Ok(resp) => resp,
        Err(err) => return request_failed(name, err),
    };
    let mut problems = Vec::new();
    if ![STATUS_NOT_FOUND, STATUS_BAD_REQUEST].contains(&resp.status) {
        problems.push(format!(
            "expected {STATUS_NOT_FOUND} or {STATUS_BAD_REQUEST}, got {}",
            resp.status
        ));
    }
    let text = resp.body.trim();
    if text != TEXT_INVALID_ID {
        problems.push(format!("expected empty body, got {text:?}"));
    }
    CheckResult::from_problems(name, problems)
}

/// Body fragment a router prints when no POST handler exists for `url`.
fn cannot_post_text(url: &str) -> String {
    let path = reqwest::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    format!("Cannot POST {path}")
}

async fn wrong_method_check(client: &CatalogClient, id: i64) -> CheckResult {
    let name = format!("post_product[{id}] not allowed");
    let url = client.product_url(id);
    let resp = match client.post_to(&url, &Payload::Json(json!({}))).await {
        Ok(resp) => resp,
        Err(err) => return request_failed(name, err),
    };
    let mut problems = Vec::new();
    if resp.status != STATUS_METHOD_NOT_ALLOWED {
        problems.push(format!("expected {STATUS_METHOD_NOT_ALLOWED}, got {}", resp.status));
    }
    let expected = cannot_post_text(&url);
    if !resp.body.contains(&expected) {
        problems.push(format!("expected body to mention {expected:?}, got {:?}", resp.body.trim()));
    }
    CheckResult::from_problems(name, problems)
}

pub async fn check_list_products(client: &CatalogClient) -> SuiteReport {
    let mut report = SuiteReport::new(Suite::ListProducts);
    let resp = match client.list_products().await {
        Ok(resp) => resp,
        Err(err) => {
            report.push(request_failed("list_products request".to_string(), err));
            return report;
        }
    };

    report.push(CheckResult::expect_status("list_products status", resp.status, &[STATUS_OK]));
    report.push(content_type_check("list_products content type".to_string(), &resp));

    let count = match resp.json() {
        Ok(Value::Array(items)) => items.len(),
        Ok(_) => {
            report.push(CheckResult::fail("list_products body", "expected a list of products"));
            return report;
        }
        Err(err) => {
            report.push(CheckResult::fail("list_products body", err.to_string()));
            return report;
        }
    };

    for minimum in LIST_MINIMUMS {
        let name = format!("list_products at least {minimum}");
        report.push(if count >= minimum {
            CheckResult::pass(name)
        } else {
            CheckResult::fail(name, format!("expected at least {minimum} products, got {count}"))
        });
    }
    report
}

pub async fn check_create_product(client: &CatalogClient) -> SuiteReport {
    let mut report = SuiteReport::new(Suite::CreateProduct);

    for (i, product) in fixtures::valid_products().iter().enumerate() {
        let name = format!("create_product[valid#{i}]");
        let payload = match serde_json::to_value(product) {
            Ok(body) => Payload::Json(body),
            Err(err) => {
                report.push(CheckResult::fail(name, err.to_string()));
                continue;
            }
        };
        match client.create_product(&payload).await {
            Ok(resp) => report.push(CheckResult::from_problems(name, created_problems(&resp, product))),
            Err(err) => report.push(request_failed(name, err)),
        }
    }

    for group in fixtures::invalid_groups() {
        for (i, payload) in group.payloads.iter().enumerate() {
            let name = format!("create_product[{}#{i}] rejected", group.name);
            report.push(match client.create_product(payload).await {
                Ok(resp) => CheckResult::expect_status(name, resp.status, group.accepted_statuses),
                Err(err) => request_failed(name, err),
            });
        }
    }

    report
}

/// Problems with a create response for a valid `sent` product.
fn created_problems(resp: &ApiResponse, sent: &NewProduct) -> Vec<String> {
    if resp.status != STATUS_OK {
        return vec![format!("expected {STATUS_OK}, got {}", resp.status)];
    }
    let body = match resp.json() {
        Ok(body) => body,
        Err(err) => return vec![err.to_string()],
    };
    let problems = validate_product_shape(&body);
    if !problems.is_empty() {
        return problems;
    }
    if !(body["id"].is_i64() || body["id"].is_u64()) {
        return vec![format!("new id should be an integer, got {}", body["id"])];
    }
    match serde_json::from_value::<Product>(body) {
        Ok(created) => sent.differences(&created),
        Err(err) => vec![format!("created product does not decode: {err}")],
    }
}

pub async fn check_delete_product(client: &CatalogClient, cfg: &Config) -> SuiteReport {
    let mut report = SuiteReport::new(Suite::DeleteProduct);

    match client.product_ids(cfg.run.sample_percent).await {
        Ok(ids) => {
            for id in ids {
                report.push(delete_existing_check(client, id).await);
            }
        }
        Err(err) => report.push(CheckResult::fail("fetch product ids", err.to_string())),
    }

    match client.next_product_id().await {
        Ok(next_id) => {
            for id in fixtures::undeletable_ids(next_id) {
                let name = format!("delete_product[{id}] rejected");
                report.push(match client.delete_product(&id).await {
                    Ok(resp) => CheckResult::expect_status(
                        name,
                        resp.status,
                        &[STATUS_BAD_REQUEST, STATUS_METHOD_NOT_ALLOWED],
                    ),
                    Err(err) => request_failed(name, err),
                });
            }
        }
        Err(err) => report.push(CheckResult::fail("fetch next product id", err.to_string())),
    }

    report
}

async fn delete_existing_check(client: &CatalogClient, id: i64) -> CheckResult {
    let name = format!("delete_product[{id}]");
    let resp = match client.delete_product(id).await {
        Ok(resp) => resp,
        Err(err) => return request_failed(name, err),
    };
    if resp.status != STATUS_OK {
        return CheckResult::fail(name, format!("expected {STATUS_OK}, got {}", resp.status));
    }
    match resp.json() {
        Ok(body) if body.get("id").and_then(Value::as_i64) == Some(id) => CheckResult::pass(name),
        Ok(body) => CheckResult::fail(name, format!("expected deleted id {id}, got {}", body["id"])),
        Err(err) => CheckResult::fail(name, err.to_string()),
    }
}

pub async fn check_load(cfg: &Config) -> Result<SuiteReport> {
    let plan = LoadPlan::from_config(cfg)?;
    let harness = LoadHarness::from_config(cfg)?;
    let run = harness.run(&plan).await?;
    info!("\n{run}");

    let v = &run.verdict;
    let detail = format!(
        "{}/{} succeeded ({:.2}%, required {:.2}%), avg {:.4} s",
        v.success_count,
        v.total,
        v.success_ratio * 100.0,
        v.min_success_ratio * 100.0,
        v.avg_duration_secs
    );
    let mut report = SuiteReport::new(Suite::Load);
    report.push(CheckResult {
        name: format!("load {} {}", plan.method, plan.url),
        passed: run.passed(),
        detail: Some(detail),
    });
    Ok(report)
}
