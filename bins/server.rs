use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn init_logging() {
    // 提前加载 .env，使得 RUST_LOG / LOG_FORMAT 等环境变量生效
    dotenv().ok();
    common::utils::logging::init_logging_from_env();
    info!(service = "kv_gateway", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> std::process::ExitCode {
    init_logging();

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    // Panic 钩子：捕获异常并输出错误日志，便于排查问题
    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "kv_gateway",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    // 读取线程配置（优先 config.toml，其次环境变量 TOKIO_WORKER_THREADS）
    let worker_threads = match configs::AppConfig::load() {
        Ok(cfg) => cfg.server.worker_threads,
        Err(_) => std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()),
    };

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads {
        builder.worker_threads(w);
    }

    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "kv_gateway", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "kv_gateway",
        event = "start",
        %service_id,
        pid,
        version,
        threads = worker_threads.unwrap_or_default(),
        "kv gateway starting"
    );

    // server::run 内部处理 Ctrl+C / SIGTERM 并在退出前停止备份任务
    match rt.block_on(server::run()) {
        Ok(()) => {
            info!(service = "kv_gateway", event = "stop", %service_id, pid, "kv gateway stopped normally");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "kv_gateway", event = "run_failed", error = %e, "startup or serve failed");
            std::process::ExitCode::FAILURE
        }
    }
}
