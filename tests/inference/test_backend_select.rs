// Tests for model family selection and prompt wrapping

use docqa::inference::{
    unsupported_model_message, LlmBackend, ModelType, PromptFormat, GPT4ALL_BACKEND_ID,
};

#[test]
fn test_supported_model_types_parse() {
    assert_eq!(ModelType::parse("LlamaCpp"), Some(ModelType::LlamaCpp));
    assert_eq!(ModelType::parse("GPT4All"), Some(ModelType::Gpt4All));
}

#[test]
fn test_case_variants_are_unsupported() {
    // Selection is verbatim; near-misses must not be coerced
    for raw in ["llamacpp", "LLAMACPP", "gpt4all", "Gpt4all", "GPT4ALL"] {
        assert_eq!(ModelType::parse(raw), None, "should reject {raw:?}");
    }
}

#[test]
fn test_unknown_and_empty_model_types_are_unsupported() {
    assert_eq!(ModelType::parse("Mistral"), None);
    assert_eq!(ModelType::parse(""), None);
    assert_eq!(ModelType::parse(" LlamaCpp"), None);
}

#[test]
fn test_unsupported_model_diagnostic_wording() {
    assert_eq!(
        unsupported_model_message("Mistral"),
        "Model Mistral not supported!"
    );
    assert_eq!(
        unsupported_model_message("llamacpp"),
        "Model llamacpp not supported!"
    );
    // An unset MODEL_TYPE comes through as the empty string
    assert_eq!(unsupported_model_message(""), "Model  not supported!");
}

#[test]
fn test_gpt4all_family_is_pinned_to_gptj() {
    assert_eq!(GPT4ALL_BACKEND_ID, "gptj");
    assert_eq!(
        PromptFormat::for_backend_id(GPT4ALL_BACKEND_ID),
        PromptFormat::Gpt4AllJ
    );
}

#[test]
fn test_gptj_render_wraps_prompt_in_instruction_format() {
    let rendered = PromptFormat::Gpt4AllJ.render("What color is the sky?");
    assert!(rendered.starts_with("### Prompt:\n"));
    assert!(rendered.contains("What color is the sky?"));
    assert!(rendered.ends_with("\n### Response:\n"));
}

#[test]
fn test_plain_render_leaves_prompt_untouched() {
    let prompt = "Question: anything\nHelpful Answer:";
    assert_eq!(PromptFormat::Plain.render(prompt), prompt);
}

#[test]
fn test_build_fails_on_missing_model_file() {
    let err = LlmBackend::build(ModelType::LlamaCpp, "/nonexistent/model.gguf", 512).unwrap_err();
    assert!(err.to_string().contains("Model file not found"));
}
