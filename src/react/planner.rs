//! Planner：拼 zero-shot ReAct prompt、调用 LLM、把输出解析为带标签的 Decision
//!
//! 输出格式（Thought / Action / Action Input / Observation / Final Answer）：
//! - 同时出现可解析的 Action 与 "Final Answer:" → ParseError
//! - 有 Action + Action Input → Tool
//! - 只有 "Final Answer:" → FinalAnswer
//! - 其余 → ParseError（observation 描述缺了什么，回灌给模型）

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::memory::{render_transcript, Message};

pub const FINAL_ANSWER_ACTION: &str = "Final Answer:";
const OBSERVATION_PREFIX: &str = "\nObservation:";
const MISSING_ACTION_ERROR: &str = "Invalid Format: Missing 'Action:' after 'Thought:'";
const MISSING_ACTION_INPUT_ERROR: &str = "Invalid Format: Missing 'Action Input:' after 'Action:'";
const EMPTY_ACTION_INPUT_ERROR: &str = "Invalid Format: 'Action Input:' must not be empty";
const FINAL_ANSWER_AND_ACTION_ERROR: &str =
    "Parsing LLM output produced both a final answer and a parse-able action";
const CONCLUDE_INSTRUCTION: &str =
    "\n\nI now need to return a final answer based on the previous steps:";

const PREFIX: &str =
    "Answer the following questions as best you can. You have access to the following tools:";
const FORMAT_INSTRUCTIONS: &str = "Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question";
const SUFFIX: &str = "Begin!";

fn action_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
            .expect("action regex")
    })
}

fn action_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)").expect("action-only regex"))
}

fn action_input_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)").expect("action-input regex")
    })
}

/// 一次模型调用的决策结果；控制器按标签分支，不再临时解析文本
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// 调用工具；log 为模型原始输出（写入 scratchpad）
    Tool {
        tool: String,
        input: String,
        log: String,
    },
    FinalAnswer {
        answer: String,
        log: String,
    },
    /// 输出无法解析；observation 会作为下一轮的 Observation
    ParseError {
        raw: String,
        observation: String,
    },
}

/// 已完成的一步：模型输出 + 观察结果
#[derive(Debug, Clone)]
pub struct AgentStep {
    pub action: StepAction,
    pub observation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    Tool { tool: String, input: String, log: String },
    /// 不存在的工具名，未实际调用
    InvalidTool { tool: String, input: String, log: String },
    ParseError { raw: String },
}

impl StepAction {
    pub fn log(&self) -> &str {
        match self {
            StepAction::Tool { log, .. } | StepAction::InvalidTool { log, .. } => log,
            StepAction::ParseError { raw } => raw,
        }
    }
}

/// 丢弃模型自己编造的 Observation 及其后内容
fn cut_at_observation(output: &str) -> &str {
    match output.find(OBSERVATION_PREFIX) {
        Some(idx) => &output[..idx],
        None => output,
    }
}

pub fn parse_llm_output(output: &str) -> Decision {
    let text = cut_at_observation(output).trim();
    let includes_answer = text.contains(FINAL_ANSWER_ACTION);

    if let Some(caps) = action_re().captures(text) {
        if includes_answer {
            return Decision::ParseError {
                raw: text.to_string(),
                observation: format!("{FINAL_ANSWER_AND_ACTION_ERROR}: {text}"),
            };
        }
        let tool = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let input = caps
            .get(2)
            .map(|m| m.as_str().trim().trim_matches('"').trim())
            .unwrap_or_default();
        if input.is_empty() {
            return Decision::ParseError {
                raw: text.to_string(),
                observation: EMPTY_ACTION_INPUT_ERROR.to_string(),
            };
        }
        return Decision::Tool {
            tool: tool.to_string(),
            input: input.to_string(),
            log: text.to_string(),
        };
    }

    if includes_answer {
        let answer = text
            .rsplit(FINAL_ANSWER_ACTION)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        return Decision::FinalAnswer {
            answer,
            log: text.to_string(),
        };
    }

    let observation = if !action_only_re().is_match(text) {
        MISSING_ACTION_ERROR
    } else if !action_input_re().is_match(text) {
        MISSING_ACTION_INPUT_ERROR
    } else {
        "Could not parse LLM output"
    };
    Decision::ParseError {
        raw: text.to_string(),
        observation: observation.to_string(),
    }
}

/// scratchpad：历次 "输出 + Observation"，以 "Thought: " 结尾引导下一步
pub fn build_scratchpad(steps: &[AgentStep]) -> String {
    let mut pad = String::new();
    for step in steps {
        pad.push_str(step.action.log());
        pad.push_str(&format!("\nObservation: {}\nThought: ", step.observation));
    }
    pad
}

/// Planner：持有 LLM 与按工具集生成的 system prompt
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl Planner {
    /// tools: (name, description)，按注册顺序
    pub fn new(llm: Arc<dyn LlmClient>, tools: &[(String, String)]) -> Self {
        Self {
            llm,
            system_prompt: zero_shot_prompt(tools),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    fn build_messages(&self, input: &str, history: &[Message], scratchpad: &str) -> Vec<Message> {
        let mut system = self.system_prompt.clone();
        if !history.is_empty() {
            system.push_str("\n\nPrevious conversation:\n");
            system.push_str(&render_transcript(history));
        }
        vec![
            Message::system(system),
            Message::user(format!("Question: {input}\nThought:{scratchpad}")),
        ]
    }

    async fn call(&self, messages: &[Message]) -> Result<String, AgentError> {
        self.llm.complete(messages).await.map_err(AgentError::LlmError)
    }

    /// 一次 THINKING：调用模型并解析为 Decision
    pub async fn decide(
        &self,
        input: &str,
        history: &[Message],
        steps: &[AgentStep],
    ) -> Result<Decision, AgentError> {
        let messages = self.build_messages(input, history, &build_scratchpad(steps));
        let output = self.call(&messages).await?;
        Ok(parse_llm_output(&output))
    }

    /// 迭代耗尽后的最后一次生成：要求模型基于已有步骤直接给出答案
    pub async fn conclude(
        &self,
        input: &str,
        history: &[Message],
        steps: &[AgentStep],
    ) -> Result<String, AgentError> {
        let mut scratchpad = build_scratchpad(steps);
        scratchpad.push_str(CONCLUDE_INSTRUCTION);
        let messages = self.build_messages(input, history, &scratchpad);
        let output = self.call(&messages).await?;
        match parse_llm_output(&output) {
            Decision::FinalAnswer { answer, .. } => Ok(answer),
            _ => Ok(output.trim().to_string()),
        }
    }
}

fn zero_shot_prompt(tools: &[(String, String)]) -> String {
    let tool_strings = tools
        .iter()
        .map(|(name, desc)| format!("{name}: {desc}"))
        .collect::<Vec<_>>()
        .join("\n");
    let tool_names = tools
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{PREFIX}\n\n{tool_strings}\n\n{}\n\n{SUFFIX}",
        FORMAT_INSTRUCTIONS.replace("{tool_names}", &tool_names)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_call() {
        let out = "Thought: I should look up the price\nAction: search_service_info\nAction Input: \"EcoTee price\"";
        match parse_llm_output(out) {
            Decision::Tool { tool, input, log } => {
                assert_eq!(tool, "search_service_info");
                assert_eq!(input, "EcoTee price");
                assert!(log.starts_with("Thought:"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_final_answer() {
        let out = "Thought: I now know the final answer\nFinal Answer: 月額1000円です。";
        assert_eq!(
            parse_llm_output(out),
            Decision::FinalAnswer {
                answer: "月額1000円です。".to_string(),
                log: out.to_string(),
            }
        );
    }

    #[test]
    fn test_parse_both_is_error() {
        let out = "Action: search_web_info\nAction Input: x\nFinal Answer: y";
        match parse_llm_output(out) {
            Decision::ParseError { observation, .. } => {
                assert!(observation.starts_with(FINAL_ANSWER_AND_ACTION_ERROR))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_action() {
        match parse_llm_output("I think the answer is 42") {
            Decision::ParseError { observation, raw } => {
                assert_eq!(observation, MISSING_ACTION_ERROR);
                assert_eq!(raw, "I think the answer is 42");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_action_input() {
        match parse_llm_output("Thought: hmm\nAction: search_web_info") {
            Decision::ParseError { observation, .. } => {
                assert_eq!(observation, MISSING_ACTION_INPUT_ERROR)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_input_is_error() {
        assert!(matches!(
            parse_llm_output("Action: search_web_info\nAction Input: \"\""),
            Decision::ParseError { .. }
        ));
    }

    #[test]
    fn test_hallucinated_observation_is_cut() {
        let out = "Action: search_company_info\nAction Input: EcoTee\nObservation: made up\nFinal Answer: fake";
        match parse_llm_output(out) {
            Decision::Tool { tool, input, .. } => {
                assert_eq!(tool, "search_company_info");
                assert_eq!(input, "EcoTee");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_prompt_lists_tools_in_order() {
        let tools = vec![
            ("b_tool".to_string(), "does b".to_string()),
            ("a_tool".to_string(), "does a".to_string()),
        ];
        let prompt = zero_shot_prompt(&tools);
        assert!(prompt.contains("b_tool: does b\na_tool: does a"));
        assert!(prompt.contains("one of [b_tool, a_tool]"));
    }

    #[test]
    fn test_scratchpad() {
        let steps = vec![AgentStep {
            action: StepAction::Tool {
                tool: "t".into(),
                input: "q".into(),
                log: "Action: t\nAction Input: q".into(),
            },
            observation: "result".into(),
        }];
        assert_eq!(
            build_scratchpad(&steps),
            "Action: t\nAction Input: q\nObservation: result\nThought: "
        );
    }
}
