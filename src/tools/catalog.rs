//! 固定的五个客服工具：名称与描述是模型选择工具的唯一依据，改名或改写描述都会改变行为。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::AgentError;
use crate::knowledge::{ChunkingConfig, KnowledgeStore, RagChain};
use crate::llm::LlmClient;
use crate::tools::{KnowledgeBaseTool, ToolRegistry, WebSearchTool};

pub const SEARCH_COMPANY_INFO_TOOL_NAME: &str = "search_company_info";
pub const SEARCH_SERVICE_INFO_TOOL_NAME: &str = "search_service_info";
pub const SEARCH_CUSTOMER_COMMUNICATION_INFO_TOOL_NAME: &str = "search_customer_communication";
pub const SEARCH_WEB_INFO_TOOL_NAME: &str = "search_web_info";
pub const SEARCH_ALL_DATA_TOOL_NAME: &str = "search_all_data";

pub const SEARCH_COMPANY_INFO_TOOL_DESCRIPTION: &str = concat!(
    "会社に関する情報を検索します。このToolは、",
    "会社の概要、歴史、所在地、連絡先情報などを取得するために使用します。",
    "入力には具体的な会社名を含めてください。"
);

pub const SEARCH_SERVICE_INFO_TOOL_DESCRIPTION: &str = concat!(
    "サービスに関する情報を検索します。このToolは、",
    "提供されているサービスの詳細、料金、利用条件などを取得するために使用します。",
    "入力にはサービス名またはカテゴリを含めてください。"
);

pub const SEARCH_CUSTOMER_COMMUNICATION_INFO_TOOL_DESCRIPTION: &str = concat!(
    "顧客とのやり取りに関する情報を検索します。このToolは、",
    "過去の問い合わせ履歴、対応状況、顧客満足度などを取得するために使用します。",
    "入力には顧客名または問い合わせIDを含めてください。"
);

pub const SEARCH_WEB_INFO_TOOL_DESCRIPTION: &str = concat!(
    "インターネット上の情報を検索します。このToolは、",
    "一般的な質問や外部情報を取得するために使用します。",
    "入力には具体的な検索クエリを含めてください。"
);

pub const SEARCH_ALL_DATA_TOOL_DESCRIPTION: &str = concat!(
    "すべてのデータベースを横断的に検索します。このToolは、",
    "会社、サービス、顧客情報を含む複数のデータソースから情報を取得するために使用します。",
    "特定のカテゴリに限定されない質問や、複数のカテゴリにまたがる質問に適しています。",
    "例えば、『EcoTeeに関するすべての情報を教えてください』や、",
    "『顧客とサービスに関する関連情報をまとめて教えてください』といった質問に対応します。",
    "入力には具体的なキーワードを含めてください。"
);

fn rag_tool(
    cfg: &AppConfig,
    llm: &Arc<dyn LlmClient>,
    partition: &str,
    dirs: &[std::path::PathBuf],
    name: &str,
    description: &str,
) -> KnowledgeBaseTool {
    let k = &cfg.knowledge;
    let mut store = KnowledgeStore::new(
        partition,
        ChunkingConfig::with_sizes(k.chunk_size, k.chunk_overlap),
    );
    store.load_dirs(dirs);
    let chain = RagChain::new(store, llm.clone(), k.top_k);
    KnowledgeBaseTool::new(name, description, Arc::new(chain))
}

/// 按固定顺序注册五个工具：会社 / サービス / 顧客 / Web / 全データ
pub fn build_support_tools(
    cfg: &AppConfig,
    llm: Arc<dyn LlmClient>,
) -> Result<ToolRegistry, AgentError> {
    let k = &cfg.knowledge;
    let mut tools = ToolRegistry::new();
    tools.register(rag_tool(
        cfg,
        &llm,
        "company",
        std::slice::from_ref(&k.company_dir),
        SEARCH_COMPANY_INFO_TOOL_NAME,
        SEARCH_COMPANY_INFO_TOOL_DESCRIPTION,
    ))?;
    tools.register(rag_tool(
        cfg,
        &llm,
        "service",
        std::slice::from_ref(&k.service_dir),
        SEARCH_SERVICE_INFO_TOOL_NAME,
        SEARCH_SERVICE_INFO_TOOL_DESCRIPTION,
    ))?;
    tools.register(rag_tool(
        cfg,
        &llm,
        "customer",
        std::slice::from_ref(&k.customer_dir),
        SEARCH_CUSTOMER_COMMUNICATION_INFO_TOOL_NAME,
        SEARCH_CUSTOMER_COMMUNICATION_INFO_TOOL_DESCRIPTION,
    ))?;
    tools.register(WebSearchTool::new(
        SEARCH_WEB_INFO_TOOL_NAME,
        SEARCH_WEB_INFO_TOOL_DESCRIPTION,
        &cfg.tools.search,
    ))?;
    tools.register(rag_tool(
        cfg,
        &llm,
        "all",
        &k.all_data_dirs(),
        SEARCH_ALL_DATA_TOOL_NAME,
        SEARCH_ALL_DATA_TOOL_DESCRIPTION,
    ))?;
    Ok(tools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;

    #[test]
    fn test_builds_five_unique_tools() {
        let dir = tempfile::tempdir().unwrap();
        let company = dir.path().join("company");
        std::fs::create_dir_all(&company).unwrap();
        std::fs::write(company.join("profile.md"), "EcoTee Inc. is based in Osaka.").unwrap();

        let mut cfg = AppConfig::default();
        cfg.knowledge.company_dir = company;
        cfg.knowledge.service_dir = dir.path().join("service");
        cfg.knowledge.customer_dir = dir.path().join("customer");

        let llm: Arc<dyn LlmClient> = Arc::new(ScriptedLlmClient::new(Vec::<String>::new()));
        let tools = build_support_tools(&cfg, llm).unwrap();
        assert_eq!(
            tools.tool_names(),
            vec![
                SEARCH_COMPANY_INFO_TOOL_NAME,
                SEARCH_SERVICE_INFO_TOOL_NAME,
                SEARCH_CUSTOMER_COMMUNICATION_INFO_TOOL_NAME,
                SEARCH_WEB_INFO_TOOL_NAME,
                SEARCH_ALL_DATA_TOOL_NAME,
            ]
        );
        assert!(tools
            .descriptions()
            .iter()
            .all(|(_, d)| d.contains("検索します")));
    }

    #[test]
    fn test_unreadable_document_does_not_block_startup() {
        let dir = tempfile::tempdir().unwrap();
        let company = dir.path().join("company");
        std::fs::create_dir_all(&company).unwrap();
        std::fs::write(company.join("good.md"), "EcoTee Inc. is based in Osaka.").unwrap();
        std::fs::write(company.join("legacy.txt"), [0x82u8, 0xa0, 0xff, 0xfe]).unwrap();

        let mut cfg = AppConfig::default();
        cfg.knowledge.company_dir = company;
        cfg.knowledge.service_dir = dir.path().join("service");
        cfg.knowledge.customer_dir = dir.path().join("customer");

        let llm: Arc<dyn LlmClient> = Arc::new(ScriptedLlmClient::new(Vec::<String>::new()));
        let tools = build_support_tools(&cfg, llm).unwrap();
        assert_eq!(tools.len(), 5);
    }
}
