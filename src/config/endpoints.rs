//! Agent Hive flow 端點表。
//!
//! 每個端點只是一筆資料：flow 路徑、輸入型態、欄位對應與必填規則、
//! 預設欄位、模型 tweaks、逾時與回應擷取方式。實際呼叫由
//! [`crate::core::playground`] 的通用函式處理。

use crate::domain::model::Section;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Enrichment,
    IcpProfiling,
    MarketIntelligence,
    ChampionScoring,
    EngagementSignal,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::Enrichment,
        Endpoint::IcpProfiling,
        Endpoint::MarketIntelligence,
        Endpoint::ChampionScoring,
        Endpoint::EngagementSignal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Enrichment => "enrichment",
            Endpoint::IcpProfiling => "icp_profiling",
            Endpoint::MarketIntelligence => "market_intelligence",
            Endpoint::ChampionScoring => "champion_scoring",
            Endpoint::EngagementSignal => "engagement_signal",
        }
    }

    pub fn spec(&self) -> &'static EndpointSpec {
        match self {
            Endpoint::Enrichment => &ENRICHMENT,
            Endpoint::IcpProfiling => &ICP_PROFILING,
            Endpoint::MarketIntelligence => &MARKET_INTELLIGENCE,
            Endpoint::ChampionScoring => &CHAMPION_SCORING,
            Endpoint::EngagementSignal => &ENGAGEMENT_SIGNAL,
        }
    }

    pub fn from_section(section: Section) -> Option<Self> {
        match section {
            Section::CsvConverter => None,
            Section::LeadEnrichment => Some(Endpoint::Enrichment),
            Section::IcpProfiling => Some(Endpoint::IcpProfiling),
            Section::MarketIntelligence => Some(Endpoint::MarketIntelligence),
            Section::ChampionScoring => Some(Endpoint::ChampionScoring),
            Section::EngagementSignal => Some(Endpoint::EngagementSignal),
        }
    }

    pub fn section(&self) -> Section {
        match self {
            Endpoint::Enrichment => Section::LeadEnrichment,
            Endpoint::IcpProfiling => Section::IcpProfiling,
            Endpoint::MarketIntelligence => Section::MarketIntelligence,
            Endpoint::ChampionScoring => Section::ChampionScoring,
            Endpoint::EngagementSignal => Section::EngagementSignal,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Endpoint::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(needle) || e.spec().flow == needle)
            .or_else(|| needle.parse::<Section>().ok().and_then(Endpoint::from_section))
            .ok_or_else(|| format!("unknown endpoint: {}", s))
    }
}

/// 請求的 `input_value` 如何產生
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// 整個輸入物件序列化成 JSON 字串
    JsonObject,
    /// 只送出指定欄位的純文字
    Text { field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseExtractor {
    /// 取訊息中第一個 ```json 區塊
    EmbeddedJson,
    /// 同上，但只保留列出的欄位
    EmbeddedFields(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCheck {
    None,
    LinkedinProfileUrl,
}

/// 表單欄位 → 送出的鍵
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub source: &'static str,
    pub target: &'static str,
    pub required: bool,
    pub check: FieldCheck,
}

const fn required(name: &'static str) -> FieldRule {
    FieldRule {
        source: name,
        target: name,
        required: true,
        check: FieldCheck::None,
    }
}

const fn rename(source: &'static str, target: &'static str) -> FieldRule {
    FieldRule {
        source,
        target,
        required: false,
        check: FieldCheck::None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelTweak {
    pub component: &'static str,
    pub key: &'static str,
    pub model: &'static str,
}

#[derive(Debug)]
pub struct EndpointSpec {
    pub endpoint: Endpoint,
    pub flow: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub input: InputKind,
    pub fields: &'static [FieldRule],
    /// 至少要有其中一個，否則只記錄警告
    pub recommended_any: &'static [&'static str],
    /// 使用者沒給時補上的欄位
    pub defaults: &'static [(&'static str, &'static str)],
    pub tweak: Option<ModelTweak>,
    pub timeout_seconds: Option<u64>,
    pub extractor: ResponseExtractor,
    pub sample_input: &'static str,
}

impl EndpointSpec {
    pub fn tweaks(&self) -> Option<Value> {
        self.tweak.map(|t| json!({ t.component: { t.key: t.model } }))
    }

    pub fn required_targets(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|r| r.required).map(|r| r.target)
    }

    pub fn sample(&self) -> Value {
        serde_json::from_str(self.sample_input).unwrap_or(Value::Null)
    }
}

const GEMINI_FLASH: &str = "gemini-2.5-flash";

pub static ENRICHMENT: EndpointSpec = EndpointSpec {
    endpoint: Endpoint::Enrichment,
    flow: "lead-enrichment",
    title: "Lead Enrichment API",
    description: "Enrich company data with additional information",
    input: InputKind::JsonObject,
    fields: &[
        rename("company_name", "Company Name"),
        rename("company_domain", "Company Domain"),
    ],
    recommended_any: &["Company Name", "Company Domain", "name", "domain"],
    defaults: &[],
    tweak: None,
    timeout_seconds: Some(300),
    extractor: ResponseExtractor::EmbeddedJson,
    sample_input: r#"{
  "Company Name": "Example Corp",
  "Company Domain": "example.com",
  "Company Employee Count": "250",
  "Company Industry": "Technology",
  "Company Headquarters": "San Francisco, CA",
  "Company Linkedin Url": "https://linkedin.com/company/example-corp"
}"#,
};

pub static ICP_PROFILING: EndpointSpec = EndpointSpec {
    endpoint: Endpoint::IcpProfiling,
    flow: "icp-profiling",
    title: "ICP Profiling API",
    description: "Score how well an enriched lead fits the ideal customer profile",
    input: InputKind::JsonObject,
    fields: &[
        required("domain"),
        required("enriched_lead"),
        required("product_context"),
        required("target_icp"),
    ],
    recommended_any: &[],
    defaults: &[
        ("product_context", ICP_PRODUCT_CONTEXT),
        ("target_icp", ICP_TARGET_PROFILE),
    ],
    tweak: Some(ModelTweak {
        component: "GoogleGenerativeAIModel-r4iC7",
        key: "model_name",
        model: GEMINI_FLASH,
    }),
    timeout_seconds: Some(180),
    extractor: ResponseExtractor::EmbeddedJson,
    sample_input: r#"{
  "enriched_lead": {
    "Company": "ExampleTech Solutions Pvt Ltd",
    "Size": "51-200 employees",
    "Domain": "exampletechsolutions.com",
    "LinkedIn URL": "https://www.linkedin.com/company/exampletech-solutions"
  },
  "domain": "exampletechsolutions.com"
}"#,
};

pub static MARKET_INTELLIGENCE: EndpointSpec = EndpointSpec {
    endpoint: Endpoint::MarketIntelligence,
    flow: "market-intelligence",
    title: "Market Intelligence API",
    description: "Company profile, industry analysis and latest news for a lead",
    input: InputKind::JsonObject,
    fields: &[],
    recommended_any: &[],
    defaults: &[],
    tweak: None,
    timeout_seconds: Some(300),
    extractor: ResponseExtractor::EmbeddedJson,
    sample_input: r#"{
  "Company": "ExampleTech Solutions Pvt Ltd",
  "Size": "51-200 employees",
  "Domain": "exampletechsolutions.com",
  "LinkedIn URL": "https://www.linkedin.com/company/exampletech-solutions"
}"#,
};

pub static CHAMPION_SCORING: EndpointSpec = EndpointSpec {
    endpoint: Endpoint::ChampionScoring,
    flow: "champion-scoring",
    title: "Champion Scoring API",
    description: "Score potential champions from a LinkedIn profile and an ICP result",
    input: InputKind::JsonObject,
    fields: &[
        FieldRule {
            source: "linkedin_url",
            target: "linkedin_url",
            required: true,
            check: FieldCheck::LinkedinProfileUrl,
        },
        required("icp_result"),
    ],
    recommended_any: &[],
    defaults: &[],
    tweak: Some(ModelTweak {
        component: "GoogleGenerativeAIModel-hc9sp",
        key: "model",
        model: GEMINI_FLASH,
    }),
    timeout_seconds: Some(180),
    extractor: ResponseExtractor::EmbeddedJson,
    sample_input: r#"{
  "linkedin_url": "https://www.linkedin.com/in/sampleexecutive/",
  "icp_result": {
    "product_fit": "Both",
    "icp_score": 3,
    "prospect_level": "Low",
    "engagement_readiness": "Cold"
  }
}"#,
};

pub static ENGAGEMENT_SIGNAL: EndpointSpec = EndpointSpec {
    endpoint: Endpoint::EngagementSignal,
    flow: "linkedin-posts",
    title: "Person Engagement Signal API",
    description: "Analyze LinkedIn posts to identify engagement signals",
    input: InputKind::Text {
        field: "linkedin_url",
    },
    fields: &[
        FieldRule {
            source: "url",
            target: "linkedin_url",
            required: true,
            check: FieldCheck::LinkedinProfileUrl,
        },
    ],
    recommended_any: &[],
    defaults: &[],
    tweak: Some(ModelTweak {
        component: "GoogleGenerativeAIModel-pmAtd",
        key: "model_name",
        model: GEMINI_FLASH,
    }),
    timeout_seconds: Some(120),
    extractor: ResponseExtractor::EmbeddedFields(&["person_name", "engagement_signal_summary"]),
    sample_input: r#"{"linkedin_url": "https://www.linkedin.com/in/username/"}"#,
};

const ICP_PRODUCT_CONTEXT: &str = "\n**QpiAI Pro – No-Code AI + AutoML + MLOps Platform**\n- End-to-end visual pipeline builder (data ingestion → annotation → training → deployment → monitoring).\n- Auto-annotation, AutoML hyperparameter tuning, SFT/DPO LLM fine-tuning.\n- Production-ready deployments (REST/gRPC), real-time dashboards, on-prem/cloud/VPC options.\n\n**Agent Hive – No-Code Enterprise Agent Orchestration**\n- GUI-based multi-agent builder with dynamic memory, RAG, tool integrations, real-time streams.\n- Domain-specific and enterprise-level specialist agents + orchestrator, distributed tracing & monitoring.\n- Integrate your own AI/ML models as tools inside agents.\n- Planning, memory adaptation, human-in-the-loop guardrails, knowledge ingestion from field systems.";

const ICP_TARGET_PROFILE: &str = "\n- Regulated SMBs/enterprises: Healthcare, Finance/Legal, Retail/E-commerce, Manufacturing/Industrial, Robotics, Education, Agritech, Smart Cities.\n- Size: 50-500 employees.\n- Signals:\n  - Manual image/video annotation workflows or in-house dataset creation (↑ Pro fit)\n  - CV/LLM PoCs with no AutoML, MLOps, or fine-tuning infra (↑ Pro fit)\n  - AI teams manually managing training, tuning, or deployment pipelines (↑ Pro fit)\n  - Rule-based bots, single-task chatbots, or RPA tools with no memory or planning (↑ Hive fit)\n  - Companies using agent frameworks but lacking production-grade orchestration (↑ Hive fit)\n  - Workflows with multiple steps/roles/systems that could benefit from intelligent agents (↑ Hive fit)\n  - Companies building domain-specific copilots (↑ Hive fit)";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_endpoint_has_matching_table_entry() {
        for endpoint in Endpoint::ALL {
            assert_eq!(endpoint.spec().endpoint, endpoint);
            assert_eq!(Endpoint::from_section(endpoint.section()), Some(endpoint));
            assert!(!endpoint.spec().sample().is_null(), "{} sample", endpoint);
        }
    }

    #[test]
    fn test_endpoint_parsing() {
        assert_eq!("icp".parse::<Endpoint>().unwrap(), Endpoint::IcpProfiling);
        assert_eq!(
            "linkedin-posts".parse::<Endpoint>().unwrap(),
            Endpoint::EngagementSignal
        );
        assert_eq!(
            "champion_scoring".parse::<Endpoint>().unwrap(),
            Endpoint::ChampionScoring
        );
        assert!("convert".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_tweaks_shape() {
        assert_eq!(
            ICP_PROFILING.tweaks().unwrap(),
            json!({"GoogleGenerativeAIModel-r4iC7": {"model_name": "gemini-2.5-flash"}})
        );
        assert!(ENRICHMENT.tweaks().is_none());
    }

    #[test]
    fn test_required_targets() {
        let required: Vec<&str> = CHAMPION_SCORING.required_targets().collect();
        assert_eq!(required, vec!["linkedin_url", "icp_result"]);
        assert_eq!(MARKET_INTELLIGENCE.required_targets().count(), 0);
    }
}
