//! 发送给模型的指令文本。

use crate::style::StyleSettings;

/// 生成“提示词合成”请求的指令。
///
/// 有风格参考图时要求模型吸收其色调、材质与氛围，但不复制其中的物体。
pub fn build_synthesis_instruction(settings: &StyleSettings, has_style_image: bool) -> String {
    let mut instruction = format!(
        "You are an expert product photographer and art director. \
         Write a single detailed prompt for an image model that will restage an existing \
         product photo as a professional studio shot. \
         Composition: {}. Lighting: {}. Camera: {}. ",
        settings.aspect_ratio.description(),
        settings.lighting.description(),
        settings.perspective.description(),
    );

    if has_style_image {
        instruction.push_str(
            "The attached image is a style reference: describe its colour palette, background \
             materials, mood and tonal qualities and ask for them to be matched. \
             Do not describe or include any objects from the reference image. ",
        );
    }

    instruction.push_str(
        "The product itself must stay unchanged in shape, colour, label and branding. \
         Reply with the prompt text only, without any preamble or formatting.",
    );
    instruction
}

/// 图片编辑请求的文本部分。
pub fn build_edit_instruction(prompt: &str, has_style_image: bool) -> String {
    let prompt = prompt.trim();
    if has_style_image {
        format!(
            "{prompt}\n\nThe first image is the product to restage. \
             The second image is only a style reference for tone and atmosphere."
        )
    } else {
        prompt.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{AspectRatio, CameraPerspective, LightingStyle};

    #[test]
    fn instruction_mentions_every_setting() {
        let settings = StyleSettings::new(
            AspectRatio::Landscape,
            LightingStyle::GoldenHour,
            CameraPerspective::TopDown,
        );
        let text = build_synthesis_instruction(&settings, false);

        assert!(text.contains(AspectRatio::Landscape.description()));
        assert!(text.contains(LightingStyle::GoldenHour.description()));
        assert!(text.contains(CameraPerspective::TopDown.description()));
        assert!(!text.contains("style reference"));
    }

    #[test]
    fn style_image_adds_reference_guidance() {
        let text = build_synthesis_instruction(&StyleSettings::default(), true);
        assert!(text.contains("style reference"));
    }

    #[test]
    fn edit_instruction_passes_prompt_through_without_style() {
        assert_eq!(build_edit_instruction("  a shot  ", false), "a shot");
        assert!(build_edit_instruction("a shot", true).starts_with("a shot\n\n"));
    }
}
