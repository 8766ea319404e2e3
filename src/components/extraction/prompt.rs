use super::DocumentKind;

const PROMPT_TEMPLATE: &str = "Extract every academic schedule item from the attached {kind} document and return them as a JSON array in English.
Follow these rules strictly:
1. Leave out TA office hours, professor office hours and assignment release dates.
2. Include quizzes, midterms, final exams, project deadlines of any kind, assignment submission deadlines, days with no class, holidays, reading days and breaks of any kind.
3. Include nothing but schedule information.
4. Every object must have exactly these keys: summary, location, description, colorId, start, end.
5. start and end must be objects holding only a 'date' key in YYYY-MM-DD format, without 'dateTime' or 'timeZone'. The end date is the day after the last day so the entry shows as an all-day event, for example 'start': {'date': '2025-09-01'}, 'end': {'date': '2025-09-02'}.
6. An item spanning several consecutive days is a single object. A break from June 1 to June 10 starts on June 1 and ends on June 11.
7. Set colorId to {color_id}.
8. Prefix the summary with the file name in brackets, like \"[{name}] Midterm\". Do not add the prefix for holidays, semester breaks or days with no class.
9. The description is a short 3 to 4 word description of the item. Use the description from the document when it has one, otherwise write one.
10. When the item is a holiday, a semester break or a day with no class, the description must contain the matching words: holiday, break or no class.
11. Output valid JSON only, with no other text.";

/// Build the extraction prompt for one document
pub fn build_prompt(kind: DocumentKind, name: &str, color_id: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{kind}", kind.label())
        .replace("{name}", name)
        .replace("{color_id}", color_id)
}
