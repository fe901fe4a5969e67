//! Business context and prompt assembly.
//!
//! The business context is sent as system-level guidance on every provider
//! call. It is never stored in a conversation log.

use crate::conversation::Message;

/// Company description injected into every provider call.
pub const BUSINESS_CONTEXT: &str = r#"
# AI Innovate Solutions - Your Premier AI Software Agency

## About Us
AI Innovate Solutions is a cutting-edge AI software development agency specializing in creating custom AI-powered applications, chatbots, and automation solutions for businesses of all sizes. With a team of experienced developers and AI specialists, we bring innovative technology solutions to solve your business challenges.

## Our Services
1. **Custom AI Application Development**
   - Web and mobile applications with AI integration
   - Enterprise software solutions
   - AI-powered dashboards and analytics platforms

2. **Chatbot Development**
   - Customer service chatbots
   - Sales and marketing chatbots
   - Internal process automation chatbots

3. **Machine Learning Solutions**
   - Predictive analytics models
   - Computer vision applications
   - Natural language processing systems

4. **AI Consultation**
   - AI strategy development
   - Technology stack recommendations
   - Implementation roadmaps

## Our Process
1. **Discovery** - We begin by understanding your business needs and objectives
2. **Strategy** - Our team develops a tailored approach to address your specific challenges
3. **Development** - We build your solution using the latest AI technologies and best practices
4. **Deployment** - We ensure smooth integration with your existing systems
5. **Support** - Ongoing maintenance and updates to keep your solution operating at peak performance

## Technologies We Use
- Python, TensorFlow, PyTorch for ML/AI development
- React, Angular, Vue.js for frontend interfaces
- Node.js, Flask, Django for backend systems
- AWS, Azure, and Google Cloud for deployment
- Various AI APIs including OpenAI, Google, and specialized services

## Why Choose Us
- **Expertise**: Our team brings years of experience in AI and software development
- **Innovation**: We stay at the forefront of AI technology advancements
- **Quality**: We deliver robust, scalable, and maintainable solutions
- **Partnership**: We work closely with you as a strategic technology partner
- **Results**: We focus on creating solutions that drive real business value

## Contact Information
- **Email**: hello@aiinnovate.example
- **Phone**: +1 555 0100
- **Office Hours**: Monday-Friday, 9am-6pm EST
"#;

/// Role and tone instruction shared by both providers.
pub const ASSISTANT_INSTRUCTION: &str = "You are an AI assistant for AI Innovate Solutions, an AI software development agency. Use the following company information to answer customer inquiries. Always be professional, helpful, and accurate. If you don't know something specific about the company beyond what's provided, suggest the customer contact us directly.";

/// Extra directive for providers whose replies go through the formatter.
pub const BULLET_DIRECTIVE: &str =
    "When using bullet points, use asterisks (*) at the start of each point.";

/// Closing line of the flattened generation prompt.
pub const RESPONSE_DIRECTIVE: &str = "Provide a helpful response:";

/// System prompt for the generation provider: instruction, bullet directive, context.
pub fn generation_system_prompt() -> String {
    format!("{ASSISTANT_INSTRUCTION} {BULLET_DIRECTIVE}\n\n{BUSINESS_CONTEXT}")
}

/// System message content for the chat-completion provider (no bullet directive).
pub fn chat_system_prompt() -> String {
    format!("{ASSISTANT_INSTRUCTION}\n\n{BUSINESS_CONTEXT}")
}

/// Render a log as `role: content` lines.
pub fn conversation_text(conversation: &[Message]) -> String {
    conversation
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The single flattened prompt sent to the generation provider.
pub fn flatten_prompt(system_prompt: &str, conversation: &[Message]) -> String {
    format!(
        "{system_prompt}\n\nConversation history:\n{}\n\n{RESPONSE_DIRECTIVE}",
        conversation_text(conversation)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_text_joins_role_lines() {
        let log = vec![
            Message::user("What do you do?"),
            Message::assistant("We build AI apps."),
        ];
        assert_eq!(
            conversation_text(&log),
            "user: What do you do?\nassistant: We build AI apps."
        );
        assert_eq!(conversation_text(&[]), "");
    }

    #[test]
    fn flattened_prompt_layout() {
        let log = vec![Message::user("hi")];
        let prompt = flatten_prompt("SYSTEM", &log);
        assert_eq!(
            prompt,
            "SYSTEM\n\nConversation history:\nuser: hi\n\nProvide a helpful response:"
        );
    }

    #[test]
    fn generation_prompt_carries_bullet_directive() {
        let prompt = generation_system_prompt();
        assert!(prompt.starts_with(ASSISTANT_INSTRUCTION));
        assert!(prompt.contains(BULLET_DIRECTIVE));
        assert!(prompt.ends_with(BUSINESS_CONTEXT));
    }

    #[test]
    fn chat_prompt_omits_bullet_directive() {
        let prompt = chat_system_prompt();
        assert!(prompt.starts_with(ASSISTANT_INSTRUCTION));
        assert!(!prompt.contains(BULLET_DIRECTIVE));
        assert!(prompt.contains("AI Innovate Solutions - Your Premier AI Software Agency"));
    }
}
