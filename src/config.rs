use std::time::Duration;

/// 答案来源策略
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerStrategy {
    /// 单一固定题库接口
    Fixed,
    /// 按顺序尝试多个模板化题库源
    Templated,
}

impl AnswerStrategy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed" => Some(AnswerStrategy::Fixed),
            "templated" | "multi" => Some(AnswerStrategy::Templated),
            _ => None,
        }
    }
}

/// 各类固定等待时间
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timings {
    /// 作答后等待页面保存选择
    pub answer_settle: Duration,
    /// 点击下一题后等待新题目渲染
    pub advance_settle: Duration,
    /// 两题之间的额外间隔，避免请求过密
    pub between_questions: Duration,
    /// 多选题点击后的轮询间隔
    pub choice_poll_interval: Duration,
    /// 多选题最多点击次数
    pub choice_poll_attempts: usize,
    /// 两个题库源之间的间隔
    pub between_sources: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            answer_settle: Duration::from_millis(1000),
            advance_settle: Duration::from_millis(1500),
            between_questions: Duration::from_millis(500),
            choice_poll_interval: Duration::from_millis(100),
            choice_poll_attempts: 3,
            between_sources: Duration::from_millis(300),
        }
    }
}

impl Timings {
    /// 所有等待为零，用于测试和离线演练
    pub fn immediate() -> Self {
        Self {
            answer_settle: Duration::ZERO,
            advance_settle: Duration::ZERO,
            between_questions: Duration::ZERO,
            choice_poll_interval: Duration::ZERO,
            choice_poll_attempts: 3,
            between_sources: Duration::ZERO,
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 作业页面 URL（找不到目标页面时打开）
    pub target_url: String,
    /// 目标页面标题关键字
    pub target_title: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    // --- 题库配置 ---
    pub answer_strategy: AnswerStrategy,
    pub answer_api_url: String,
    pub answer_token: String,
    /// 模板化题库源 TOML 文件
    pub sources_file: Option<String>,
    // --- AI 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_system_prompt: String,
    pub timings: Timings,
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "你是一个专业全能的助手。请清晰、准确地回答问题，提供简明而准确的信息。使用正式、专业的语气。在适当情况下解释你的推理或提供背景信息，但避免不必要的冗长。始终确保答案可靠、易于理解。";

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            target_url: "about:blank".to_string(),
            target_title: None,
            verbose_logging: false,
            output_log_file: "answer_log.txt".to_string(),
            answer_strategy: AnswerStrategy::Fixed,
            answer_api_url: "https://tk.enncy.cn/query".to_string(),
            answer_token: String::new(),
            sources_file: None,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.siliconflow.cn/v1".to_string(),
            llm_model_name: "THUDM/GLM-4.1V-9B-Thinking".to_string(),
            llm_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timings: Timings::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源构建配置，未设置或无法解析的键使用默认值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            browser_debug_port: lookup("BROWSER_DEBUG_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.browser_debug_port),
            target_url: non_empty("TARGET_URL").unwrap_or(default.target_url),
            target_title: non_empty("TARGET_TITLE").or(default.target_title),
            verbose_logging: lookup("VERBOSE_LOGGING")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.verbose_logging),
            output_log_file: non_empty("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            answer_strategy: lookup("ANSWER_STRATEGY")
                .and_then(|v| AnswerStrategy::parse(&v))
                .unwrap_or(default.answer_strategy),
            answer_api_url: non_empty("ANSWER_API_URL").unwrap_or(default.answer_api_url),
            answer_token: lookup("ANSWER_TOKEN").unwrap_or(default.answer_token),
            sources_file: non_empty("SOURCES_FILE").or(default.sources_file),
            llm_api_key: lookup("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: non_empty("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: non_empty("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_system_prompt: non_empty("LLM_SYSTEM_PROMPT")
                .unwrap_or(default.llm_system_prompt),
            timings: default.timings,
        }
    }
}
