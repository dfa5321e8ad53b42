use crate::config::Config;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use surrealdb::engine::remote::http::{Client, Http};
use surrealdb::opt::auth::Root;
use surrealdb::{Response, Surreal};
use tracing::{debug, error, info};

/// 数据库服务
#[derive(Clone)]
pub struct Database {
    client: Surreal<Client>,
    pub config: Config,
}

impl Database {
    /// 创建新的数据库实例
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        // HTTP 连接地址不带 scheme 前缀
        let address = config
            .database_url
            .trim_start_matches("http://")
            .trim_start_matches("https://")
            .to_string();

        let client = Surreal::new::<Http>(address).await?;

        client
            .signin(Root {
                username: &config.database_username,
                password: &config.database_password,
            })
            .await?;

        client
            .use_ns(config.database_namespace.as_str())
            .use_db(config.database_name.as_str())
            .await?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match self.client.query("INFO FOR DB").await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(AppError::from(e))
            }
        }
    }

    /// 执行原始SQL查询
    pub async fn query(&self, sql: &str) -> Result<Response> {
        self.client.query(sql).await.map_err(AppError::from)
    }

    /// 执行带参数的查询
    pub async fn query_with_params<P>(&self, sql: &str, params: P) -> Result<Response>
    where
        P: Serialize,
    {
        self.client
            .query(sql)
            .bind(params)
            .await
            .map_err(AppError::from)
    }

    /// 创建记录
    pub async fn create<T>(&self, table: &str, data: T) -> Result<T>
    where
        T: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + Debug,
    {
        let results: Vec<T> = self
            .client
            .create(table)
            .content(data)
            .await
            .map_err(AppError::from)?;

        results
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Failed to create record".to_string()))
    }

    /// 选择整表记录
    pub async fn select<T>(&self, table: &str) -> Result<Vec<T>>
    where
        T: for<'de> Deserialize<'de> + Send + Sync + Debug,
    {
        self.client.select(table).await.map_err(AppError::from)
    }

    /// 通过ID获取单个记录
    pub async fn get_by_id<T>(&self, table: &str, id: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de> + Send + Sync + Debug,
    {
        let query = "SELECT * FROM type::thing($table, $id)";
        debug!("Fetching {}:{}", table, id);

        let mut response = self
            .query_with_params(query, serde_json::json!({ "table": table, "id": id }))
            .await?;
        let results: Vec<T> = response.take(0)?;
        Ok(results.into_iter().next())
    }

    /// 通过ID整体替换记录
    pub async fn update_by_id<T>(&self, table: &str, id: &str, data: T) -> Result<Option<T>>
    where
        T: Serialize + for<'de> Deserialize<'de> + Send + Sync + Debug,
    {
        self.client
            .update((table, id))
            .content(data)
            .await
            .map_err(AppError::from)
    }

    /// 通过ID合并部分字段
    pub async fn merge_by_id<T>(&self, table: &str, id: &str, updates: serde_json::Value) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de> + Send + Sync + Debug,
    {
        self.client
            .update((table, id))
            .merge(updates)
            .await
            .map_err(AppError::from)
    }

    /// 通过ID删除记录
    pub async fn delete_by_id(&self, table: &str, id: &str) -> Result<()> {
        let _: Option<serde_json::Value> = self
            .client
            .delete((table, id))
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    /// 查找单个记录
    pub async fn find_one<T>(&self, table: &str, field: &str, value: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de> + Send + Sync + Debug,
    {
        let query = format!("SELECT * FROM type::table($table) WHERE {} = $value LIMIT 1", field);
        let mut response = self
            .query_with_params(&query, serde_json::json!({ "table": table, "value": value }))
            .await?;
        let results: Vec<T> = response.take(0)?;
        Ok(results.into_iter().next())
    }
}

/// 分页结果结构
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, total: usize, page: usize, per_page: usize) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            data,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_result_page_math() {
        let result: PaginatedResult<i32> = PaginatedResult::new(vec![1, 2, 3], 45, 1, 20);
        assert_eq!(result.total_pages, 3);

        let exact: PaginatedResult<i32> = PaginatedResult::new(vec![], 40, 2, 20);
        assert_eq!(exact.total_pages, 2);

        let empty: PaginatedResult<i32> = PaginatedResult::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }
}
