// ==========================================
// 物料齐套测算系统 - 产品目录导入器
// ==========================================
// 职责: 解析 CSV 文件，写入产品/物料/用料清单/库存批次主数据
// 流程: 解析 → 行校验 → 单事务落库 → 批次登记
// 红线: 单个文件的全部行在一个事务内写入；文件级失败整体中止，
//       行级失败只跳过该行并记入失败清单
// ==========================================

use crate::config::ConfigManager;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::{
    BomLineRepository, ImportBatchRecord, ImportBatchRepository, ImportBatchStatus,
    MaterialRepository, NewStockLot, ProductRepository, StockLotRepository,
};
use chrono::Utc;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// 导入结果 DTO
// ==========================================

/// 单行失败记录（行号从 1 开始，按数据行计，不含表头）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowError {
    pub row_number: usize,
    pub message: String,
}

/// 一次文件导入的汇总结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub batch_id: String,
    pub entity_kind: String,
    pub total_rows: usize,
    pub imported_rows: usize,
    pub failed_rows: usize,
    pub row_errors: Vec<RowError>,
    pub elapsed_ms: i64,
}

// ==========================================
// CatalogImporter - 产品目录导入器
// ==========================================
pub struct CatalogImporter {
    product_repo: Arc<ProductRepository>,
    material_repo: Arc<MaterialRepository>,
    bom_repo: Arc<BomLineRepository>,
    stock_repo: Arc<StockLotRepository>,
    batch_repo: Arc<ImportBatchRepository>,
    config: Arc<ConfigManager>,
}

impl CatalogImporter {
    /// 创建新的 CatalogImporter 实例
    ///
    /// # 参数
    /// - product_repo: 产品主数据仓储
    /// - material_repo: 物料主数据仓储
    /// - bom_repo: 用料清单仓储
    /// - stock_repo: 库存批次仓储
    /// - batch_repo: 导入批次仓储
    /// - config: 配置管理器（读取行数上限）
    pub fn new(
        product_repo: Arc<ProductRepository>,
        material_repo: Arc<MaterialRepository>,
        bom_repo: Arc<BomLineRepository>,
        stock_repo: Arc<StockLotRepository>,
        batch_repo: Arc<ImportBatchRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            product_repo,
            material_repo,
            bom_repo,
            stock_repo,
            batch_repo,
            config,
        }
    }

    // ==========================================
    // 公开导入入口（每个实体一个文件格式）
    // ==========================================

    /// 导入产品主数据（products.csv，表头 code,name）
    ///
    /// 按 code 幂等更新：已存在的产品更新名称，不存在则新建。
    ///
    /// # 返回
    /// - Ok(ImportSummary): 导入汇总（含行级失败清单）
    /// - Err(ImportError): 文件级失败（文件缺失/表头缺失/写入失败等）
    #[instrument(skip(self, file_path))]
    pub fn import_products<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ImportSummary> {
        self.run_import(file_path.as_ref(), "products", &["code", "name"], |rows| {
            self.apply_product_rows(rows)
        })
    }

    /// 导入物料主数据（materials.csv，表头 name）
    ///
    /// 按名称去重：库中已存在同名物料时该行视为成功但不重复插入。
    #[instrument(skip(self, file_path))]
    pub fn import_materials<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ImportSummary> {
        self.run_import(file_path.as_ref(), "materials", &["name"], |rows| {
            self.apply_material_rows(rows)
        })
    }

    /// 导入用料清单（bom.csv，表头 product_code,material_name,quantity）
    ///
    /// 文件中出现的每个产品，其旧清单整体替换为文件中的行。
    /// 引用的产品编码或物料名称不存在时，该行失败，其余行照常导入。
    #[instrument(skip(self, file_path))]
    pub fn import_bom<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ImportSummary> {
        self.run_import(
            file_path.as_ref(),
            "bom",
            &["product_code", "material_name", "quantity"],
            |rows| self.apply_bom_rows(rows),
        )
    }

    /// 导入库存批次（stock.csv，表头 material_name,remainder,price）
    ///
    /// 每行追加一个新批次；remainder 留空按 0 入库，price 留空按无单价入库。
    #[instrument(skip(self, file_path))]
    pub fn import_stock<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ImportSummary> {
        self.run_import(
            file_path.as_ref(),
            "stock",
            &["material_name", "remainder", "price"],
            |rows| self.apply_stock_rows(rows),
        )
    }

    // ==========================================
    // 导入主流程（四种实体共用）
    // ==========================================

    /// 执行一次文件导入的完整生命周期
    ///
    /// 流程: 解析文件 → 行数上限检查 → 登记批次(RUNNING) →
    ///       行校验与落库 → 批次收尾(COMPLETED/COMPLETED_WITH_ERRORS/FAILED)
    fn run_import<F>(
        &self,
        file_path: &Path,
        entity_kind: &str,
        required_headers: &[&str],
        apply: F,
    ) -> ImportResult<ImportSummary>
    where
        F: FnOnce(&[HashMap<String, String>]) -> ImportResult<(usize, Vec<RowError>)>,
    {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        let source_file = file_path.display().to_string();

        info!(
            batch_id = %batch_id,
            entity_kind = entity_kind,
            file = %source_file,
            "开始导入"
        );

        // === 步骤 1: 解析文件 ===
        // 文件不存在/表头缺失/CSV 损坏属于文件级失败，此时尚未登记批次
        debug!("步骤 1: 解析文件");
        let rows = read_csv_rows(file_path, required_headers)?;
        let total_rows = rows.len();
        info!(total_rows = total_rows, "文件解析完成");

        // === 步骤 2: 行数上限检查 ===
        debug!("步骤 2: 行数上限检查");
        let row_limit = self
            .config
            .get_max_batch_rows()
            .map_err(|e| ImportError::ConfigReadError(e.to_string()))?;
        if total_rows as i64 > row_limit {
            warn!(
                total_rows = total_rows,
                row_limit = row_limit,
                "行数超出上限，中止导入"
            );
            return Err(ImportError::TooManyRows {
                actual: total_rows,
                limit: row_limit,
            });
        }

        // === 步骤 3: 登记批次 ===
        debug!("步骤 3: 登记批次");
        let record = ImportBatchRecord {
            batch_id: batch_id.clone(),
            source_file,
            entity_kind: entity_kind.to_string(),
            status: ImportBatchStatus::Running,
            total_rows: total_rows as i64,
            imported_rows: 0,
            failed_rows: 0,
            started_at: Utc::now(),
            finished_at: None,
        };
        self.batch_repo.insert_batch(&record)?;

        // === 步骤 4: 行校验与落库 ===
        debug!("步骤 4: 行校验与落库");
        match apply(&rows) {
            Ok((imported_rows, row_errors)) => {
                let failed_rows = row_errors.len();
                let status = if row_errors.is_empty() {
                    ImportBatchStatus::Completed
                } else {
                    ImportBatchStatus::CompletedWithErrors
                };

                // === 步骤 5: 批次收尾 ===
                debug!("步骤 5: 批次收尾");
                self.batch_repo.finalize_batch(
                    &batch_id,
                    status,
                    total_rows as i64,
                    imported_rows as i64,
                    failed_rows as i64,
                )?;

                let elapsed_ms = start_time.elapsed().as_millis() as i64;
                info!(
                    batch_id = %batch_id,
                    total_rows = total_rows,
                    imported_rows = imported_rows,
                    failed_rows = failed_rows,
                    elapsed_ms = elapsed_ms,
                    "导入完成"
                );

                Ok(ImportSummary {
                    batch_id,
                    entity_kind: entity_kind.to_string(),
                    total_rows,
                    imported_rows,
                    failed_rows,
                    row_errors,
                    elapsed_ms,
                })
            }
            Err(e) => {
                // 写入失败整体回滚，批次标记为 FAILED 后把原错误抛给调用方
                error!(batch_id = %batch_id, error = %e, "导入写入失败");
                if let Err(fin_err) = self.batch_repo.finalize_batch(
                    &batch_id,
                    ImportBatchStatus::Failed,
                    total_rows as i64,
                    0,
                    total_rows as i64,
                ) {
                    warn!(batch_id = %batch_id, error = %fin_err, "批次收尾失败");
                }
                Err(e)
            }
        }
    }

    // ==========================================
    // 各实体的行校验与落库
    // ==========================================

    /// 产品行: code 与 name 均不能为空，合法行按 code 幂等更新
    fn apply_product_rows(
        &self,
        rows: &[HashMap<String, String>],
    ) -> ImportResult<(usize, Vec<RowError>)> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut row_errors = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;
            let code = field(row, "code");
            let name = field(row, "name");

            if code.is_empty() {
                warn!(row_number = row_number, "产品编码为空");
                row_errors.push(RowError {
                    row_number,
                    message: "产品编码为空".to_string(),
                });
                continue;
            }
            if name.is_empty() {
                warn!(row_number = row_number, code = code, "产品名称为空");
                row_errors.push(RowError {
                    row_number,
                    message: format!("产品名称为空: {}", code),
                });
                continue;
            }

            pairs.push((code.to_string(), name.to_string()));
        }

        let written = self.product_repo.batch_upsert_products(&pairs)?;
        debug!(written = written, "产品写入完成");
        Ok((pairs.len(), row_errors))
    }

    /// 物料行: name 不能为空，已存在同名物料的行视为成功
    fn apply_material_rows(
        &self,
        rows: &[HashMap<String, String>],
    ) -> ImportResult<(usize, Vec<RowError>)> {
        let mut names: Vec<String> = Vec::new();
        let mut row_errors = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;
            let name = field(row, "name");

            if name.is_empty() {
                warn!(row_number = row_number, "物料名称为空");
                row_errors.push(RowError {
                    row_number,
                    message: "物料名称为空".to_string(),
                });
                continue;
            }

            names.push(name.to_string());
        }

        let inserted = self.material_repo.batch_insert_missing(&names)?;
        debug!(inserted = inserted, "物料写入完成");
        Ok((names.len(), row_errors))
    }

    /// 清单行: 解析产品编码与物料名称为内部 id，未知引用按行失败处理
    ///
    /// 同一产品的多行（即使不连续）合并为一组，整组替换该产品的旧清单，
    /// 行在组内保持文件出现顺序。
    fn apply_bom_rows(
        &self,
        rows: &[HashMap<String, String>],
    ) -> ImportResult<(usize, Vec<RowError>)> {
        let mut groups: Vec<(i64, Vec<(i64, i64)>)> = Vec::new();
        let mut group_index: HashMap<i64, usize> = HashMap::new();
        let mut product_cache: HashMap<String, Option<i64>> = HashMap::new();
        let mut material_cache: HashMap<String, Option<i64>> = HashMap::new();
        let mut row_errors = Vec::new();
        let mut valid_rows = 0usize;

        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;
            let product_code = field(row, "product_code");
            let material_name = field(row, "material_name");
            let quantity_raw = field(row, "quantity");

            if product_code.is_empty() {
                warn!(row_number = row_number, "产品编码为空");
                row_errors.push(RowError {
                    row_number,
                    message: "产品编码为空".to_string(),
                });
                continue;
            }
            if material_name.is_empty() {
                warn!(row_number = row_number, "物料名称为空");
                row_errors.push(RowError {
                    row_number,
                    message: "物料名称为空".to_string(),
                });
                continue;
            }

            // 解析产品引用（带缓存，避免同一编码重复查询）
            let product_id = match product_cache.get(product_code) {
                Some(cached) => *cached,
                None => {
                    let found = self.product_repo.find_by_code(product_code)?.map(|p| p.id);
                    product_cache.insert(product_code.to_string(), found);
                    found
                }
            };
            let product_id = match product_id {
                Some(id) => id,
                None => {
                    warn!(row_number = row_number, code = product_code, "未知产品编码");
                    row_errors.push(RowError {
                        row_number,
                        message: format!("未知产品编码: {}", product_code),
                    });
                    continue;
                }
            };

            // 解析物料引用
            let material_id = match material_cache.get(material_name) {
                Some(cached) => *cached,
                None => {
                    let found = self
                        .material_repo
                        .find_by_name(material_name)?
                        .map(|m| m.id);
                    material_cache.insert(material_name.to_string(), found);
                    found
                }
            };
            let material_id = match material_id {
                Some(id) => id,
                None => {
                    warn!(row_number = row_number, name = material_name, "未知物料名称");
                    row_errors.push(RowError {
                        row_number,
                        message: format!("未知物料名称: {}", material_name),
                    });
                    continue;
                }
            };

            // quantity 留空按 0 处理
            let quantity = if quantity_raw.is_empty() {
                0
            } else {
                match quantity_raw.parse::<i64>() {
                    Ok(v) => v,
                    Err(_) => {
                        warn!(row_number = row_number, raw = quantity_raw, "数量格式错误");
                        row_errors.push(RowError {
                            row_number,
                            message: format!("数量格式错误: {}", quantity_raw),
                        });
                        continue;
                    }
                }
            };

            match group_index.get(&product_id) {
                Some(&i) => groups[i].1.push((material_id, quantity)),
                None => {
                    group_index.insert(product_id, groups.len());
                    groups.push((product_id, vec![(material_id, quantity)]));
                }
            }
            valid_rows += 1;
        }

        let written = self.bom_repo.replace_lines_grouped(&groups)?;
        debug!(written = written, "清单写入完成");
        Ok((valid_rows, row_errors))
    }

    /// 库存行: 物料名称须已存在；remainder 留空按 0，price 留空按无单价
    fn apply_stock_rows(
        &self,
        rows: &[HashMap<String, String>],
    ) -> ImportResult<(usize, Vec<RowError>)> {
        let mut lots: Vec<NewStockLot> = Vec::new();
        let mut material_cache: HashMap<String, Option<i64>> = HashMap::new();
        let mut row_errors = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;
            let material_name = field(row, "material_name");
            let remainder_raw = field(row, "remainder");
            let price_raw = field(row, "price");

            if material_name.is_empty() {
                warn!(row_number = row_number, "物料名称为空");
                row_errors.push(RowError {
                    row_number,
                    message: "物料名称为空".to_string(),
                });
                continue;
            }

            let material_id = match material_cache.get(material_name) {
                Some(cached) => *cached,
                None => {
                    let found = self
                        .material_repo
                        .find_by_name(material_name)?
                        .map(|m| m.id);
                    material_cache.insert(material_name.to_string(), found);
                    found
                }
            };
            let material_id = match material_id {
                Some(id) => id,
                None => {
                    warn!(row_number = row_number, name = material_name, "未知物料名称");
                    row_errors.push(RowError {
                        row_number,
                        message: format!("未知物料名称: {}", material_name),
                    });
                    continue;
                }
            };

            let remainder = if remainder_raw.is_empty() {
                0
            } else {
                match remainder_raw.parse::<i64>() {
                    Ok(v) => v,
                    Err(_) => {
                        warn!(
                            row_number = row_number,
                            raw = remainder_raw,
                            "库存数量格式错误"
                        );
                        row_errors.push(RowError {
                            row_number,
                            message: format!("库存数量格式错误: {}", remainder_raw),
                        });
                        continue;
                    }
                }
            };

            let price = if price_raw.is_empty() {
                None
            } else {
                match price_raw.parse::<f64>() {
                    Ok(v) => Some(v),
                    Err(_) => {
                        warn!(row_number = row_number, raw = price_raw, "单价格式错误");
                        row_errors.push(RowError {
                            row_number,
                            message: format!("单价格式错误: {}", price_raw),
                        });
                        continue;
                    }
                }
            };

            lots.push(NewStockLot {
                material_id,
                remainder,
                price,
            });
        }

        let written = self.stock_repo.batch_insert_lots(&lots)?;
        debug!(written = written, "库存写入完成");
        Ok((lots.len(), row_errors))
    }
}

// ==========================================
// CSV 文件读取
// ==========================================

/// 读取 CSV 文件为按表头取值的行记录
///
/// - 表头与取值两侧空白会被去除
/// - 全空白行跳过（行号按保留的数据行计）
/// - 必需表头缺失时整体失败
fn read_csv_rows(
    file_path: &Path,
    required_headers: &[&str],
) -> ImportResult<Vec<HashMap<String, String>>> {
    // 检查文件存在
    if !file_path.exists() {
        return Err(ImportError::FileNotFound(file_path.display().to_string()));
    }

    // 检查扩展名
    if let Some(ext) = file_path.extension() {
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(
                ext.to_string_lossy().to_string(),
            ));
        }
    }

    // 打开 CSV 文件
    let file = File::open(file_path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // 允许行长度不一致
        .from_reader(file);

    // 读取表头并检查必需列
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    for required in required_headers {
        if !headers.iter().any(|h| h == required) {
            return Err(ImportError::MissingHeader {
                file: file_path.display().to_string(),
                header: (*required).to_string(),
            });
        }
    }

    // 读取所有行
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row_map = HashMap::new();

        for (col_idx, value) in record.iter().enumerate() {
            if let Some(header) = headers.get(col_idx) {
                row_map.insert(header.clone(), value.trim().to_string());
            }
        }

        // 跳过完全空白的行
        if row_map.values().all(|v| v.is_empty()) {
            continue;
        }

        rows.push(row_map);
    }

    Ok(rows)
}

/// 按表头取单元格值，列缺失时按空串处理
fn field<'a>(row: &'a HashMap<String, String>, key: &str) -> &'a str {
    row.get(key).map(String::as_str).unwrap_or("")
}
