/// Read-through caching on top of [`Cache`](crate::db::Cache).
///
/// Returns the cached value for `$key` when present. Otherwise awaits
/// `$block`, queues the result for a background write with `$ttl` seconds to
/// live, and returns it. Must be used in a function returning `AppResult`.
///
/// # Example
/// ```rust,ignore
/// cached!(cache, CacheKey::CategoryInsights(category), 300, async move {
///     compute_insights(category).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get_from_cache(&key).await? {
            tracing::debug!(key = %key, "Cache hit");
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
