//! One translator per supported EC2 action.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{params::leading_int, Context, Outcome};
use crate::{vdc::CreateInstance, Error, Result};

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, ctx: &Context<'_>) -> Result<Outcome>;
}

pub struct RunInstances;
pub struct TerminateInstances;
pub struct DescribeInstances;
pub struct DescribeImages;

static TRANSLATORS: &[(&str, &dyn Translator)] = &[
    ("RunInstances", &RunInstances),
    ("TerminateInstances", &TerminateInstances),
    ("DescribeInstances", &DescribeInstances),
    ("DescribeImages", &DescribeImages),
];

pub fn lookup(action: &str) -> Option<&'static dyn Translator> {
    TRANSLATORS
        .iter()
        .find(|(name, _)| *name == action)
        .map(|(_, translator)| *translator)
}

pub fn supported() -> impl Iterator<Item = &'static str> {
    TRANSLATORS.iter().map(|(name, _)| *name)
}

/// Number of create calls for a RunInstances request.
///
/// `MinCount` defaults to 1 and `MaxCount` to `MinCount`. Nothing is started
/// when `MinCount` exceeds `cap`; otherwise `MaxCount` is clamped to `cap`.
pub fn instances_to_start(min_count: Option<&str>, max_count: Option<&str>, cap: u32) -> u32 {
    let cap = i64::from(cap);
    let min = min_count.map(leading_int).unwrap_or(1);
    let max = max_count.map(leading_int).unwrap_or(min);
    if min > cap {
        0
    } else {
        // clamped to [0, cap], so the cast is lossless
        max.clamp(0, cap) as u32
    }
}

fn create_request(ctx: &Context<'_>) -> CreateInstance {
    let params = ctx.params;
    CreateInstance {
        image_id: params.owned("ImageId"),
        instance_spec_id: params.owned("InstanceType"),
        security_groups: params.indexed_list("SecurityGroup"),
        user_data: params.owned("UserData"),
        ssh_key: params.owned("KeyName"),
        host_id: params.owned("Placement.AvailabilityZone"),
        host_pool_id: ctx.config.host_node_id.clone(),
        network_id: Some(ctx.config.network_pool_id.clone()),
    }
}

/// The error for a batch stopped at its first failure. A batch that made no
/// progress reports the failure itself.
fn abort_batch(
    action: &'static str,
    processed: Vec<String>,
    requested: usize,
    err: Error,
) -> Error {
    if processed.is_empty() {
        err
    } else {
        Error::partial_batch(action, processed, requested, err)
    }
}

fn filter_by_id<T>(
    records: Vec<T>,
    wanted: &[String],
    id: impl Fn(&T) -> Option<&str>,
) -> Vec<T> {
    if wanted.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|record| id(record).is_some_and(|id| wanted.iter().any(|w| w == id)))
        .collect()
}

#[async_trait]
impl Translator for RunInstances {
    async fn translate(&self, ctx: &Context<'_>) -> Result<Outcome> {
        let create = create_request(ctx);
        let count = instances_to_start(
            ctx.params.get("MinCount"),
            ctx.params.get("MaxCount"),
            ctx.config.max_instances_to_start,
        );
        let delay = ctx.config.create_delay();
        debug!(count, ?create, "RunInstances");

        let mut instances = Vec::new();
        for index in 0..count {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match ctx.vdc.create_instance(ctx.account_id, &create).await {
                Ok(instance) => {
                    info!(
                        instance_id = instance.id.as_deref().unwrap_or_default(),
                        launch_index = index,
                        "starting instance"
                    );
                    instances.push(instance);
                }
                Err(err) => {
                    let processed = instances
                        .iter()
                        .map(|i| i.id.clone().unwrap_or_default())
                        .collect();
                    return Err(abort_batch("RunInstances", processed, count as usize, err));
                }
            }
        }

        Ok(Outcome::RunInstances {
            account_id: ctx.account_id.to_string(),
            instances,
        })
    }
}

#[async_trait]
impl Translator for TerminateInstances {
    async fn translate(&self, ctx: &Context<'_>) -> Result<Outcome> {
        let instance_ids = ctx.params.indexed_list("InstanceId");
        for (done, id) in instance_ids.iter().enumerate() {
            if let Err(err) = ctx.vdc.terminate_instance(ctx.account_id, id).await {
                let processed = instance_ids[..done].to_vec();
                return Err(abort_batch(
                    "TerminateInstances",
                    processed,
                    instance_ids.len(),
                    err,
                ));
            }
            info!(instance_id = %id, "terminating instance");
        }
        Ok(Outcome::TerminateInstances { instance_ids })
    }
}

#[async_trait]
impl Translator for DescribeInstances {
    async fn translate(&self, ctx: &Context<'_>) -> Result<Outcome> {
        let wanted = ctx.params.indexed_list("InstanceId");
        let instances = ctx.vdc.list_instances(ctx.account_id).await?;
        Ok(Outcome::DescribeInstances {
            account_id: ctx.account_id.to_string(),
            instances: filter_by_id(instances, &wanted, |i| i.id.as_deref()),
        })
    }
}

#[async_trait]
impl Translator for DescribeImages {
    async fn translate(&self, ctx: &Context<'_>) -> Result<Outcome> {
        let images = ctx.vdc.list_images(ctx.account_id).await?;
        let wanted = ctx.params.indexed_list("ImageId");
        Ok(Outcome::DescribeImages {
            images: filter_by_id(images, &wanted, |i| i.id.as_deref()),
        })
    }
}
