use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn main() -> std::process::ExitCode {
    // 提前加载 .env，使得 RUST_LOG / DATABASE_URL 等环境变量生效
    dotenv().ok();

    let cfg = match configs::AppConfig::load_or_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default();
            error!(
                service = "server",
                event = "config_invalid",
                error = %e,
                "failed to load configuration"
            );
            return std::process::ExitCode::FAILURE;
        }
    };
    common::utils::logging::init_logging_with_format(&cfg.logging.format);
    info!(
        service = "server",
        event = "logger_init",
        format = %cfg.logging.format,
        "tracing subscriber initialized"
    );

    // 基础服务上下文（不含敏感信息）
    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    // Panic 钩子：捕获异常并输出错误日志
    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "server",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    let worker_threads = cfg.server.worker_threads;
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads { builder.worker_threads(w); }

    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(
                service = "server",
                event = "runtime_build_failed",
                error = %e,
                "failed to build tokio runtime"
            );
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "server",
        event = "start",
        %service_id,
        pid,
        version,
        threads = worker_threads.unwrap_or_default(),
        http_port = cfg.server.port,
        grpc_port = cfg.server.grpc_port(),
        "customer service starting"
    );

    // server::run 内部监听 Ctrl+C 并优雅停机
    rt.block_on(async move {
        match tokio::spawn(server::run(cfg)).await {
            Ok(Ok(())) => {
                info!(
                    service = "server",
                    event = "stop",
                    %service_id,
                    pid,
                    "server stopped normally"
                );
                std::process::ExitCode::SUCCESS
            }
            Ok(Err(e)) => {
                error!(
                    service = "server",
                    event = "run_failed",
                    error = %e,
                    "server::run returned error"
                );
                std::process::ExitCode::FAILURE
            }
            Err(e) => {
                error!(
                    service = "server",
                    event = "task_join_error",
                    error = %e,
                    "server task join error"
                );
                std::process::ExitCode::FAILURE
            }
        }
    })
}
