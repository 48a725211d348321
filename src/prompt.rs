//! Prompt construction, including the choice between a fresh course and a
//! revision of the previous one.

use crate::datetime::PlanTime;

/// Words that mark a request as feedback on the previous course
const FEEDBACK_KEYWORDS: [&str; 6] = ["바꿔", "교체", "다른", "비싸", "너무", "별로"];

pub const SYSTEM_CONTEXT: &str = r#"
당신은 데이트 코스를 추천해주는 전문 챗봇입니다.

역할:
- 사용자의 자연어 입력을 분석하여 맞춤형 데이트 코스를 추천합니다.
- 코스의 순서는 사용자의 요청에 따라 자유롭게 구성할 수 있습니다.
- 각 장소는 반드시 아래 형식으로 추천해주세요:

### **[코스 1] 가게명**

🎯 내용: [구체적인 활동 설명 - 예: 이탈리안 파인다이닝, 디저트 카페, 루프탑 바 등]

✨ 추천 이유: [그 장소만의 특별한 특징이나 대표 메뉴의 특징을 구체적으로 설명]

⭐ 별점: [네이버 플레이스 별점과 리뷰 수]

💰 가격대: [1인당 예상 비용]

🔗 네이버 링크: [네이버 플레이스 URL]

### **[코스 2] 가게명**
...

추천 시 주의사항:
1. 모든 장소는 실제 존재하는 곳이어야 합니다.
2. 각 장소의 링크는 반드시 실제 네이버 플레이스 URL을 포함해야 합니다.
3. 별점과 리뷰 수는 네이버 플레이스의 데이터를 정확히 표시합니다.
4. 추천 이유는 그 장소만의 고유한 특징이나 대표 메뉴를 구체적으로 설명해주세요.
5. 가격대는 구체적인 금액으로 표시해주세요.
6. 사용자가 특정 장소나 활동에 대해 피드백을 주면, 해당 부분만 수정하고 나머지는 유지해주세요.
7. 날씨를 참고하되 실내/실외 활동을 적절히 섞어서 추천해주세요.
8. 정보를 찾지 못했다는 등의 부정적인 멘트는 하지 마세요.
9. 모든 정보는 실제로 존재하는 정확한 정보여야 합니다.
10. 별점이나 리뷰에 대한 부가 설명은 하지 마세요.
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// A new course from scratch
    Fresh,
    /// Edit the previous course, keeping stops the feedback does not mention
    Revision,
}

/// True when a previous course exists and the request reads as feedback on it
pub fn is_revision(request: &str, previous: Option<&str>) -> bool {
    if previous.is_none() {
        return false;
    }
    let request = request.to_lowercase();
    FEEDBACK_KEYWORDS.iter().any(|k| request.contains(*k))
}

/// Everything the model needs for one turn
pub struct PromptInput<'a> {
    pub context: &'a str,
    pub request: &'a str,
    pub previous: Option<&'a str>,
    pub plan: PlanTime,
    pub weather: &'a str,
}

impl PromptInput<'_> {
    pub fn kind(&self) -> PromptKind {
        if is_revision(self.request, self.previous) {
            PromptKind::Revision
        } else {
            PromptKind::Fresh
        }
    }

    pub fn render(&self) -> String {
        let situation = format!(
            "날짜: {}\n시간: {}\n날씨 정보:\n{}",
            self.plan.date.format("%Y-%m-%d"),
            self.plan.time.format("%H:%M"),
            self.weather.trim()
        );

        match (self.kind(), self.previous) {
            (PromptKind::Revision, Some(previous)) => format!(
                "{}\n\n이전 추천 코스:\n{}\n\n사용자 피드백: {}\n\n{}\n\n\
                 위 피드백을 반영하여 필요한 부분만 수정한 새로운 코스를 추천해주세요.\n\
                 이전 추천에서 피드백 받지 않은 장소들은 그대로 유지해주세요.\n",
                self.context, previous, self.request, situation
            ),
            _ => format!(
                "{}\n\n사용자: {}\n\n{}\n\n위 사용자의 요청에 맞는 데이트 코스를 추천해주세요.",
                self.context, self.request, situation
            ),
        }
    }
}
