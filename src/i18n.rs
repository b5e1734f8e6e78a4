use std::collections::HashMap;

pub struct I18n {
    translations: HashMap<String, HashMap<String, String>>,
    current_lang: String,
}

fn table(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl I18n {
    pub fn new(lang: &str) -> Self {
        let mut translations = HashMap::new();

        // English
        let en = table(&[
            ("help_about", "Smart two-way translation from the terminal"),
            // Translate flow
            ("detecting", "Detecting language..."),
            ("translating", "Translating..."),
            ("translation_complete", "Translation complete: {0} → {1}"),
            ("translation_failed", "Translation failed"),
            ("config_error_title", "Configuration error"),
            ("empty_input", "Please enter text to translate."),
            ("saved_to_history", "Saved to history"),
            ("history_save_failed", "Translated, but saving to history failed: {0}"),
            // Expand flow
            ("expanding", "Expanding content..."),
            ("expansion_failed", "Expansion failed"),
            ("empty_bullets", "Please enter some bullet points first."),
            ("expanded_vietnamese", "Vietnamese"),
            ("expanded_english", "English"),
            ("expanded_original", "Original notes"),
            // History
            ("no_history", "No translation history"),
            ("no_results", "No results for \"{0}\""),
            ("history_count", "{0} translations in history"),
            ("history_deleted", "Deleted {0}"),
            ("history_not_found", "No history item with id {0}"),
            ("confirm_clear_title", "Clear all history? {0} items will be permanently deleted."),
            ("confirm_clear_prompt", "Type 'yes' to confirm: "),
            ("clear_aborted", "Aborted, nothing was deleted"),
            ("history_cleared", "History cleared"),
            ("label_id", "ID"),
            ("label_source", "Source"),
            ("label_target", "Target"),
            ("label_time", "Time"),
            ("label_original", "Original"),
            ("label_translation", "Translation"),
            // Relative time
            ("time_just_now", "Just now"),
            ("time_minutes_ago", "{0}m ago"),
            ("time_hours_ago", "{0}h ago"),
            ("time_days_ago", "{0}d ago"),
            // Languages
            ("languages_title", "Languages:"),
            ("languages_auto", "Auto-detect (source)"),
            ("languages_smart", "Smart target ({0} ↔ {1})"),
            ("languages_hint", "Any other language name is passed to the model as-is."),
            // Errors
            ("error_create_data_dir", "Failed to create data directory"),
            ("error_read_input", "Failed to read input text"),
            ("stdin_hint", "Reading text from stdin, finish with Ctrl-D"),
        ]);

        // Tiếng Việt
        let vi = table(&[
            ("help_about", "Dịch hai chiều thông minh ngay trên terminal"),
            ("detecting", "Đang nhận diện ngôn ngữ..."),
            ("translating", "Đang dịch..."),
            ("translation_complete", "Dịch xong: {0} → {1}"),
            ("translation_failed", "Dịch thất bại"),
            ("config_error_title", "Lỗi cấu hình"),
            ("empty_input", "Vui lòng nhập văn bản cần dịch."),
            ("saved_to_history", "Đã lưu vào lịch sử"),
            ("history_save_failed", "Đã dịch, nhưng không lưu được lịch sử: {0}"),
            ("expanding", "Đang mở rộng nội dung..."),
            ("expansion_failed", "Mở rộng nội dung thất bại"),
            ("empty_bullets", "Vui lòng nhập các gạch đầu dòng trước."),
            ("expanded_vietnamese", "Tiếng Việt"),
            ("expanded_english", "Tiếng Anh"),
            ("expanded_original", "Ghi chú gốc"),
            ("no_history", "Chưa có lịch sử dịch"),
            ("no_results", "Không có kết quả cho \"{0}\""),
            ("history_count", "Có {0} bản dịch trong lịch sử"),
            ("history_deleted", "Đã xoá {0}"),
            ("history_not_found", "Không tìm thấy mục có id {0}"),
            ("confirm_clear_title", "Xoá toàn bộ lịch sử? {0} mục sẽ bị xoá vĩnh viễn."),
            ("confirm_clear_prompt", "Gõ 'yes' để xác nhận: "),
            ("clear_aborted", "Đã huỷ, không có gì bị xoá"),
            ("history_cleared", "Đã xoá lịch sử"),
            ("label_id", "ID"),
            ("label_source", "Nguồn"),
            ("label_target", "Đích"),
            ("label_time", "Thời gian"),
            ("label_original", "Bản gốc"),
            ("label_translation", "Bản dịch"),
            ("time_just_now", "Vừa xong"),
            ("time_minutes_ago", "{0} phút trước"),
            ("time_hours_ago", "{0} giờ trước"),
            ("time_days_ago", "{0} ngày trước"),
            ("languages_title", "Ngôn ngữ:"),
            ("languages_auto", "Tự nhận diện (nguồn)"),
            ("languages_smart", "Đích thông minh ({0} ↔ {1})"),
            ("languages_hint", "Tên ngôn ngữ khác sẽ được gửi nguyên văn cho mô hình."),
            ("error_create_data_dir", "Không tạo được thư mục dữ liệu"),
            ("error_read_input", "Không đọc được văn bản đầu vào"),
            ("stdin_hint", "Đang đọc văn bản từ stdin, kết thúc bằng Ctrl-D"),
        ]);

        translations.insert("en".to_string(), en);
        translations.insert("vi".to_string(), vi);

        let lang = lang.to_lowercase();
        let effective_lang = if lang.starts_with("vi") || lang == "vietnamese" {
            "vi"
        } else {
            "en"
        };

        Self {
            translations,
            current_lang: effective_lang.to_string(),
        }
    }

    pub fn t(&self, key: &str) -> String {
        if let Some(lang_map) = self.translations.get(&self.current_lang) {
            if let Some(value) = lang_map.get(key) {
                return value.clone();
            }
        }
        key.to_string()
    }

    pub fn t_format(&self, key: &str, args: &[&str]) -> String {
        let template = self.t(key);
        let mut result = template;
        for (i, arg) in args.iter().enumerate() {
            result = result.replace(&format!("{{{}}}", i), arg);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_language_from_locale() {
        assert_eq!(I18n::new("vi_VN").t("translating"), "Đang dịch...");
        assert_eq!(I18n::new("en_US").t("translating"), "Translating...");
        assert_eq!(I18n::new("fr_FR").t("translating"), "Translating...");
    }

    #[test]
    fn formats_positional_arguments() {
        let i18n = I18n::new("en");
        assert_eq!(
            i18n.t_format("translation_complete", &["Vietnamese", "English"]),
            "Translation complete: Vietnamese → English"
        );
    }

    #[test]
    fn unknown_key_falls_back_to_key() {
        assert_eq!(I18n::new("en").t("no_such_key"), "no_such_key");
    }

    #[test]
    fn both_tables_have_the_same_keys() {
        let i18n = I18n::new("en");
        let en = &i18n.translations["en"];
        let vi = &i18n.translations["vi"];
        for key in en.keys() {
            assert!(vi.contains_key(key), "missing vi key {}", key);
        }
        assert_eq!(en.len(), vi.len());
    }
}
