use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusBuilder;

/// 安装 Prometheus 记录器并返回暴露 /metrics 的路由。
/// 指标本身由各处的 metrics 宏上报（见请求日志中间件）。
pub async fn setup_metrics() -> anyhow::Result<Router> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!(
        "rainbow_learn_http_requests_total",
        "Total number of HTTP requests handled"
    );
    metrics::describe_histogram!(
        "rainbow_learn_http_request_duration_seconds",
        "HTTP request latency in seconds"
    );

    Ok(Router::new().route("/metrics", get(move || std::future::ready(handle.render()))))
}
