// ==========================================
// 物料齐套测算系统 - 命令行主入口
// ==========================================
// 用法:
//   kitting-mrp [request.json]          从文件或 stdin 读取测算请求
//   kitting-mrp import <kind> <file>    导入 CSV（products/materials/bom/stock）
//   kitting-mrp import-history          查看最近导入批次
// ==========================================
// 约定: stdout 只输出业务 JSON，日志与使用说明走 stderr
// ==========================================

use std::io::Read;
use std::process::ExitCode;

use kitting_mrp::api::ErrorResponse;
use kitting_mrp::app::{get_default_db_path, AppState};
use kitting_mrp::importer::ImportError;

#[tokio::main]
async fn main() -> ExitCode {
    // 初始化日志系统
    kitting_mrp::logging::init();

    tracing::info!("{} v{}", kitting_mrp::APP_NAME, kitting_mrp::VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    if matches!(args.first().map(String::as_str), Some("--help") | Some("-h")) {
        print_usage();
        return ExitCode::SUCCESS;
    }

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    let state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("初始化失败: {}", e);
            return ExitCode::from(2);
        }
    };

    match args.first().map(String::as_str) {
        Some("import") => run_import(&state, &args[1..]),
        Some("import-history") => run_import_history(&state),
        Some(path) => run_fulfillment(&state, Some(path)).await,
        None => run_fulfillment(&state, None).await,
    }
}

/// 执行齐套测算：从文件或 stdin 读取请求报文，结果 JSON 打到 stdout
///
/// 业务失败（产品不存在/校验失败）时错误 JSON 同样打到 stdout，
/// 退出码非零，便于脚本判断
async fn run_fulfillment(state: &AppState, request_path: Option<&str>) -> ExitCode {
    let body = match read_request_body(request_path) {
        Ok(body) => body,
        Err(e) => {
            eprintln!("读取请求失败: {}", e);
            return ExitCode::from(2);
        }
    };

    match state.fulfillment_api.fulfill_from_json(&body).await {
        Ok(response) => {
            let rendered =
                serde_json::to_string(&response).expect("测算响应序列化失败");
            println!("{}", rendered);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let error_body = ErrorResponse::from_api_error(&e);
            let rendered =
                serde_json::to_string(&error_body).expect("错误响应序列化失败");
            println!("{}", rendered);
            ExitCode::FAILURE
        }
    }
}

/// 读取请求报文：有路径读文件，无路径读 stdin
fn read_request_body(request_path: Option<&str>) -> std::io::Result<String> {
    match request_path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut body = String::new();
            std::io::stdin().read_to_string(&mut body)?;
            Ok(body)
        }
    }
}

/// 执行 CSV 导入：`import <kind> <file>`
fn run_import(state: &AppState, args: &[String]) -> ExitCode {
    let (kind, file) = match (args.first(), args.get(1)) {
        (Some(kind), Some(file)) => (kind.as_str(), file.as_str()),
        _ => {
            eprintln!("用法: kitting-mrp import <products|materials|bom|stock> <file.csv>");
            return ExitCode::from(2);
        }
    };

    let outcome = match kind {
        "products" => state.importer.import_products(file),
        "materials" => state.importer.import_materials(file),
        "bom" => state.importer.import_bom(file),
        "stock" => state.importer.import_stock(file),
        other => {
            eprintln!("未知导入类型: {}（支持 products/materials/bom/stock）", other);
            return ExitCode::from(2);
        }
    };

    match outcome {
        Ok(summary) => {
            let rendered = serde_json::to_string(&summary).expect("导入汇总序列化失败");
            println!("{}", rendered);
            if summary.failed_rows > 0 {
                // 行级失败不算整体失败，但用退出码提示调用方检查失败清单
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("导入失败: {}", e);
            ExitCode::from(import_failure_exit_code(&e))
        }
    }
}

/// 导入失败的退出码分类
///
/// 文件/格式/配置类失败属于使用或环境错误（退出码 2），
/// 行数超限与数据层失败属于业务失败（退出码 1）
fn import_failure_exit_code(err: &ImportError) -> u8 {
    match err {
        ImportError::FileNotFound(_)
        | ImportError::UnsupportedFormat(_)
        | ImportError::FileReadError(_)
        | ImportError::CsvParseError(_)
        | ImportError::MissingHeader { .. }
        | ImportError::ConfigReadError(_) => 2,
        ImportError::TooManyRows { .. }
        | ImportError::Repository(_)
        | ImportError::InternalError(_) => 1,
    }
}

/// 查看最近导入批次
fn run_import_history(state: &AppState) -> ExitCode {
    match state.batch_repo.list_recent(20) {
        Ok(batches) => {
            let rendered = serde_json::to_string(&batches).expect("批次列表序列化失败");
            println!("{}", rendered);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("查询导入批次失败: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    eprintln!("{} v{}", kitting_mrp::APP_NAME, kitting_mrp::VERSION);
    eprintln!();
    eprintln!("用法:");
    eprintln!("  kitting-mrp [request.json]");
    eprintln!("      从文件（缺省为 stdin）读取测算请求，输出测算结果 JSON");
    eprintln!("      请求格式: {{\"products\": [{{\"product_code\": \"P1001\", \"quantity\": 50}}]}}");
    eprintln!();
    eprintln!("  kitting-mrp import <products|materials|bom|stock> <file.csv>");
    eprintln!("      导入产品目录/库存 CSV，输出导入汇总 JSON");
    eprintln!();
    eprintln!("  kitting-mrp import-history");
    eprintln!("      输出最近 20 个导入批次");
    eprintln!();
    eprintln!("环境变量:");
    eprintln!("  KITTING_MRP_DB_PATH  数据库文件路径（缺省为用户数据目录）");
    eprintln!("  RUST_LOG             日志级别（缺省 info，日志走 stderr）");
}
