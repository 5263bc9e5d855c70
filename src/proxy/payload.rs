use crate::models::{
    Content, GenerateContentRequest, GenerationConfig, GenerationRequest, Part, ResponseModality,
};

/// The reference image, when present, goes before the prompt.
pub fn build_payload(request: &GenerationRequest) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(2);

    if let Some(image) = &request.base64_image {
        parts.push(Part::inline_data(request.mime_type(), image.as_str()));
    }
    parts.push(Part::text(request.prompt.as_str()));

    GenerateContentRequest {
        contents: vec![Content { parts }],
        generation_config: GenerationConfig {
            response_modalities: vec![ResponseModality::Text, ResponseModality::Image],
        },
    }
}
