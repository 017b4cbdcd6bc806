use std::time::Duration;

pub const SUCCESS_AUTO_CLOSE: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormNotice {
    kind: NoticeKind,
    message: String,
    auto_close: Option<Duration>,
}

impl FormNotice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            auto_close: Some(SUCCESS_AUTO_CLOSE),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            auto_close: None,
        }
    }

    pub fn auto_close(mut self, value: Option<Duration>) -> Self {
        self.auto_close = value;
        self
    }

    pub fn kind(&self) -> NoticeKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn auto_close_after(&self) -> Option<Duration> {
        self.auto_close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_notice_carries_fixed_auto_close() {
        let notice = FormNotice::success("saved");
        assert_eq!(notice.kind(), NoticeKind::Success);
        assert_eq!(notice.auto_close_after(), Some(SUCCESS_AUTO_CLOSE));
    }

    #[test]
    fn error_notice_stays_until_dismissed() {
        let notice = FormNotice::error("network error");
        assert_eq!(notice.kind(), NoticeKind::Error);
        assert_eq!(notice.auto_close_after(), None);
        assert_eq!(notice.message(), "network error");
    }

    #[test]
    fn auto_close_override_applies() {
        let notice = FormNotice::success("saved").auto_close(Some(Duration::from_millis(10)));
        assert_eq!(notice.auto_close_after(), Some(Duration::from_millis(10)));
    }
}
