//! 回答反馈的小状态机
//!
//! 回答生成后显示「はい / いいえ」按钮（answer_flg）；按「はい」显示感谢（feedback_yes_flg）；
//! 按「いいえ」显示理由输入框（feedback_no_flg），提交后显示感谢（feedback_no_reason_send_flg）。
//! 用户开始新一轮输入时全部复位。

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub answer_flg: bool,
    pub feedback_yes_flg: bool,
    pub feedback_no_flg: bool,
    pub dissatisfied_reason: String,
    pub feedback_no_reason_send_flg: bool,
}

impl Feedback {
    /// 新回答已生成：显示反馈按钮
    pub fn on_answer(&mut self) {
        *self = Feedback {
            answer_flg: true,
            ..Default::default()
        };
    }

    /// 仅在按钮可见时生效
    pub fn press_yes(&mut self) -> bool {
        if !self.buttons_visible() {
            return false;
        }
        self.answer_flg = false;
        self.feedback_yes_flg = true;
        tracing::info!("feedback: satisfied");
        true
    }

    pub fn press_no(&mut self) -> bool {
        if !self.buttons_visible() {
            return false;
        }
        self.answer_flg = false;
        self.feedback_no_flg = true;
        true
    }

    /// 提交不满意的理由；仅在输入框可见时生效
    pub fn submit_reason(&mut self, reason: impl Into<String>) -> bool {
        if !self.feedback_no_flg {
            return false;
        }
        self.dissatisfied_reason = reason.into();
        self.feedback_no_flg = false;
        self.feedback_no_reason_send_flg = true;
        tracing::info!(reason = %self.dissatisfied_reason, "feedback: dissatisfied");
        true
    }

    /// 新输入开始时复位
    pub fn reset(&mut self) {
        *self = Feedback::default();
    }

    pub fn buttons_visible(&self) -> bool {
        self.answer_flg && !self.feedback_yes_flg && !self.feedback_no_flg
    }

    pub fn thanks_visible(&self) -> bool {
        self.feedback_yes_flg || self.feedback_no_reason_send_flg
    }
}
