use crate::{
    codec::ProviderPayload,
    provider::{InferenceOutcome, InferenceProvider},
    retry::RetryPolicy,
};

/// Calls `model_id` until it succeeds, fails with a non-transient error, or
/// `policy` runs out of attempts. The last failure is returned unchanged.
///
/// Waits between attempts suspend the task rather than blocking the thread.
pub async fn invoke_with_retry<P>(
    provider: &P,
    model_id: &str,
    payload: &ProviderPayload,
    policy: &RetryPolicy,
) -> InferenceOutcome
where
    P: InferenceProvider,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;
    loop {
        match provider.invoke(model_id, payload).await {
            Ok(body) => {
                if attempt > 1 {
                    log::info!("{model_id} succeeded on attempt {attempt}/{max_attempts}");
                }
                return Ok(body);
            }
            Err(failure) => {
                let transient = failure.is_transient();
                log::warn!(
                    "Attempt {attempt}/{max_attempts} for {model_id} failed ({}): {failure}",
                    if transient { "transient" } else { "permanent" }
                );
                if !transient || attempt >= max_attempts {
                    return Err(failure);
                }
                let delay = policy.delay_after(attempt);
                log::debug!("Retrying {model_id} in {delay:?}");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
