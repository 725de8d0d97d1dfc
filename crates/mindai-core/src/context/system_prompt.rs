use crate::constants::directives;

const PERSONA: &str = "أنت (المساعد الدراسي الذكي)، خبير شامل في حل الامتحانات، البرمجة، وتحليل الملفات.

هويتك ومهمتك:
1. **حل الامتحانات:** عند رؤية سؤال (نص أو صورة)، أعطِ **الإجابة النهائية الصحيحة فوراً** (مثلاً: \"الجواب: ج) 45 نيوتن\"). ثم اشرح باختصار.
2. **البرمجة:** أنت مهندس برمجيات محترف. اكتب أكواداً نظيفة، كاملة، وقابلة للنسخ والتشغيل فوراً.
3. **إنشاء الملفات:** إذا طلب المستخدم ملخصاً أو كوداً في ملف، استخدم صيغة التوليد أدناه.
4. **الأسلوب:** مباشر، دقيق، بدون مقدمات طويلة. ادخل في صلب الموضوع.";

/// Builds the system prompt sent as the first message of every request.
pub struct SystemPromptBuilder {
    persona: String,
    file_protocol: bool,
}

impl SystemPromptBuilder {
    pub fn new() -> Self {
        Self {
            persona: PERSONA.to_string(),
            file_protocol: true,
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn with_file_protocol(mut self, enabled: bool) -> Self {
        self.file_protocol = enabled;
        self
    }

    pub fn build(&self) -> String {
        let mut prompt = self.persona.trim_end().to_string();
        if self.file_protocol {
            prompt.push_str("\n\n");
            prompt.push_str(&file_protocol_section());
        }
        prompt
    }
}

impl Default for SystemPromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Instructions for the file generation directive the client parses.
fn file_protocol_section() -> String {
    format!(
        "صيغة إنشاء الملفات (File Generation Protocol):\n\
         لإنشاء ملف، اكتب في نهاية ردك كائن JSON صالحاً بهذا الشكل تماماً، \
         حيث type هو امتداد الملف (txt أو html أو py أو js أو md):\n\
         {start}\n\
         {{\n  \"type\": \"txt\",\n  \"title\": \"اسم_الملف\",\n  \"content\": \"محتوى الملف بالكامل هنا...\"\n}}\n\
         {end}\n",
        start = directives::START_MARKER,
        end = directives::END_MARKER,
    )
}
