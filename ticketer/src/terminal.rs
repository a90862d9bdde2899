//! Terminal presentation of the form.
//!
//! Everything here reads state or prompts for raw text. Nothing validates;
//! that is the reducer's job.

use crate::types::{Field, FieldErrors, Gender, RegistrationForm};
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

/// The form as labelled lines, each error printed beneath its field
#[must_use]
pub fn render_form(form: &RegistrationForm, errors: &FieldErrors) -> String {
    let mut out = String::new();
    for field in Field::ALL {
        let value = match field {
            Field::Image => form
                .image
                .as_ref()
                .map_or_else(|| "(none)".to_string(), |image| image.file_name.clone()),
            _ => form.text(field).unwrap_or_default().to_string(),
        };
        let _ = writeln!(out, "{:<12} {value}", format!("{}:", field.label()));
        if let Some(message) = errors.get(field) {
            let _ = writeln!(out, "{:<12} ! {message}", "");
        }
    }
    out
}

/// Ask for each text field on `output`, reading answers line by line.
///
/// Returns the entered `(field, text)` pairs in form order. An answer has
/// its line ending stripped and is otherwise kept exactly as typed. Input
/// ending early leaves the remaining fields unanswered.
///
/// # Errors
///
/// Returns any I/O error from reading or writing.
pub fn prompt_form<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
) -> io::Result<Vec<(Field, String)>> {
    let mut answers = Vec::new();
    for field in Field::ALL.into_iter().filter(|field| !field.is_file()) {
        if field == Field::Gender {
            let options: Vec<_> = Gender::ALL.iter().map(|g| g.as_str()).collect();
            write!(output, "{} ({}): ", field.label(), options.join("/"))?;
        } else {
            write!(output, "{}: ", field.label())?;
        }
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let answer = line.trim_end_matches(['\n', '\r']).to_string();
        answers.push((field, answer));
    }
    Ok(answers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::types::ImageAttachment;
    use std::io::Cursor;

    #[test]
    fn errors_appear_beneath_their_field() {
        let form = RegistrationForm {
            first_name: "Ada".to_string(),
            ..RegistrationForm::default()
        };
        let mut errors = FieldErrors::new();
        errors.insert(Field::Email, "Email is required");

        let rendered = render_form(&form, &errors);
        let lines: Vec<_> = rendered.lines().collect();

        assert_eq!(lines[0], "First Name:  Ada");
        let email = lines.iter().position(|l| l.starts_with("Email:")).unwrap();
        assert_eq!(lines[email + 1].trim(), "! Email is required");
        assert_eq!(lines.iter().filter(|l| l.contains('!')).count(), 1);
    }

    #[test]
    fn image_shows_file_name() {
        let form = RegistrationForm {
            image: Some(ImageAttachment::new("me.png", vec![1])),
            ..RegistrationForm::default()
        };
        let rendered = render_form(&form, &FieldErrors::new());
        assert!(rendered.contains("Image:       me.png"));
    }

    #[test]
    fn prompts_every_text_field() {
        let input = Cursor::new("Ada\nLovelace\nada@example.com\n 24126030 \r\nfemale\n");
        let mut output = Vec::new();

        let answers = prompt_form(input, &mut output).unwrap();

        assert_eq!(
            answers,
            vec![
                (Field::FirstName, "Ada".to_string()),
                (Field::LastName, "Lovelace".to_string()),
                (Field::Email, "ada@example.com".to_string()),
                (Field::RollNumber, " 24126030 ".to_string()),
                (Field::Gender, "female".to_string()),
            ]
        );
        let prompts = String::from_utf8(output).unwrap();
        assert!(prompts.contains("Gender (male/female/other): "));
    }

    #[test]
    fn short_input_stops_early() {
        let answers = prompt_form(Cursor::new("Ada\n"), Vec::new()).unwrap();
        assert_eq!(answers, vec![(Field::FirstName, "Ada".to_string())]);
    }
}
