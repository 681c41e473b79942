//! Built-in catalog of debt-collection call scenarios, organized in ten
//! thematic groups of ten.

use crate::domain::{CustomerBehavior, OutcomeType, ScenarioDefinition, Tag};
use CustomerBehavior::*;
// `Legal` names a variant in both enums; the outcome side gets an alias.
use OutcomeType::Legal as LegalOutcome;
use OutcomeType::{Disconnect, Dispute, Negative, Neutral, Positive, Transfer};

/// Every marker token a transcript may contain.
pub fn special_tags() -> Vec<Tag> {
    [
        "disconnect",
        "transfer",
        "function_1",
        "function_2",
        "hold",
        "mute",
        "conference",
        "callback",
        "escalate",
    ]
    .iter()
    .map(Tag::new)
    .collect()
}

fn scenario(
    id: &str,
    name: &str,
    description: &str,
    customer_behavior: CustomerBehavior,
    outcome: OutcomeType,
    tags: &[&str],
) -> ScenarioDefinition {
    ScenarioDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        customer_behavior,
        outcome,
        required_tags: tags.iter().map(Tag::new).collect(),
    }
}

#[rustfmt::skip]
pub fn builtin_scenarios() -> Vec<ScenarioDefinition> {
    vec![
        // Basic payment scenarios (1-10)
        scenario("basic_payment_willing", "Customer willing to pay immediately", "Customer acknowledges debt and agrees to pay within timeframe", Cooperative, Positive, &["function_1"]),
        scenario("basic_payment_delayed", "Customer needs a few days to pay", "Customer acknowledges debt but needs time within the 10-day window", Cooperative, Positive, &["function_1"]),
        scenario("basic_payment_refused", "Customer refuses to pay", "Customer acknowledges debt but refuses to pay", Uncooperative, Negative, &["disconnect"]),
        scenario("basic_payment_partial", "Customer offers partial payment", "Customer wants to pay only part of the debt", Negotiating, Negative, &["function_2"]),
        scenario("basic_payment_confusion", "Customer confused about amount", "Customer acknowledges debt but disputes the amount", Confused, Neutral, &["function_1"]),
        scenario("basic_payment_already_paid", "Customer claims already paid", "Customer insists they already paid the debt", Disputing, Dispute, &["function_2"]),
        scenario("basic_payment_financial_hardship", "Customer experiencing financial hardship", "Customer acknowledges debt but claims financial difficulties", Hardship, Negative, &["function_1"]),
        scenario("basic_payment_medical_emergency", "Customer has medical emergency", "Customer cannot pay due to medical expenses", Hardship, Negative, &["function_1"]),
        scenario("basic_payment_job_loss", "Customer lost their job", "Customer recently unemployed and cannot pay", Hardship, Negative, &["function_1"]),
        scenario("basic_payment_family_emergency", "Customer has family emergency", "Customer dealing with family crisis affecting finances", Hardship, Negative, &["function_1"]),
        // Wrong person contacted (11-20)
        scenario("wrong_person_family", "Family member answers phone", "Spouse, parent, or child answers instead of debtor", WrongPerson, Transfer, &["transfer"]),
        scenario("wrong_person_roommate", "Roommate answers phone", "Roommate or housemate answers the call", WrongPerson, Transfer, &["transfer"]),
        scenario("wrong_person_coworker", "Coworker answers phone", "Work colleague answers the phone", WrongPerson, Transfer, &["transfer"]),
        scenario("wrong_person_stranger", "Complete stranger answers", "Wrong number, person doesn't know the debtor", WrongPerson, Disconnect, &["disconnect"]),
        scenario("wrong_person_business", "Business receptionist answers", "Called a business number instead of personal", WrongPerson, Transfer, &["transfer"]),
        scenario("wrong_person_ex_spouse", "Ex-spouse answers phone", "Former spouse answers, may or may not help", WrongPerson, Transfer, &["transfer"]),
        scenario("wrong_person_landlord", "Landlord answers phone", "Property owner answers, debtor moved out", WrongPerson, Disconnect, &["disconnect"]),
        scenario("wrong_person_new_owner", "New phone number owner", "Number was reassigned to someone else", WrongPerson, Disconnect, &["disconnect"]),
        scenario("wrong_person_friend", "Friend answers phone", "Friend of debtor answers the call", WrongPerson, Transfer, &["transfer"]),
        scenario("wrong_person_neighbor", "Neighbor answers phone", "Neighbor answers, debtor moved away", WrongPerson, Disconnect, &["disconnect"]),
        // Technical issues (21-30)
        scenario("tech_poor_connection", "Poor phone connection", "Call has bad audio quality, static, or drops", Technical, Disconnect, &["disconnect"]),
        scenario("tech_call_drops", "Call gets disconnected", "Call drops in the middle of conversation", Technical, Disconnect, &["disconnect"]),
        scenario("tech_voicemail", "Reaches voicemail", "Call goes to voicemail system", Technical, Disconnect, &["disconnect"]),
        scenario("tech_busy_signal", "Line is busy", "Phone line is busy when calling", Technical, Disconnect, &["disconnect"]),
        scenario("tech_no_answer", "No one answers", "Phone rings but no one picks up", Technical, Disconnect, &["disconnect"]),
        scenario("tech_number_disconnected", "Number is disconnected", "Phone number is no longer in service", Technical, Disconnect, &["disconnect"]),
        scenario("tech_hearing_impaired", "Customer is hearing impaired", "Customer has difficulty hearing the agent", Technical, Transfer, &["transfer"]),
        scenario("tech_language_barrier", "Language barrier", "Customer doesn't speak the agent's language well", Technical, Transfer, &["transfer"]),
        scenario("tech_echo_feedback", "Echo or feedback on line", "Technical audio issues making conversation difficult", Technical, Disconnect, &["disconnect"]),
        scenario("tech_automated_system", "Reaches automated system", "Call connects to automated phone system", Technical, Disconnect, &["disconnect"]),
        // Hostile or aggressive customers (31-40)
        scenario("hostile_angry_yelling", "Customer is angry and yelling", "Customer becomes very aggressive and hostile", Hostile, Negative, &["disconnect"]),
        scenario("hostile_threatening", "Customer makes threats", "Customer threatens the agent or company", Hostile, Negative, &["disconnect"]),
        scenario("hostile_profanity", "Customer uses profanity", "Customer swears and uses inappropriate language", Hostile, Negative, &["disconnect"]),
        scenario("hostile_harassment_claims", "Customer claims harassment", "Customer accuses agent of harassment", Hostile, Negative, &["function_2"]),
        scenario("hostile_legal_threats", "Customer threatens legal action", "Customer threatens to sue the company", Hostile, Negative, &["function_2"]),
        scenario("hostile_recording_threat", "Customer threatens to record", "Customer says they're recording the call", Hostile, Neutral, &["function_2"]),
        scenario("hostile_complaint_threat", "Customer threatens to file complaint", "Customer threatens regulatory complaint", Hostile, Negative, &["function_2"]),
        scenario("hostile_media_threat", "Customer threatens media exposure", "Customer threatens to go to media/social media", Hostile, Negative, &["function_2"]),
        scenario("hostile_personal_attacks", "Customer makes personal attacks", "Customer attacks agent personally", Hostile, Negative, &["disconnect"]),
        scenario("hostile_hangs_up_angry", "Customer hangs up angrily", "Customer ends call abruptly in anger", Hostile, Negative, &["disconnect"]),
        // Legal and regulatory issues (41-50)
        scenario("legal_bankruptcy", "Customer filed for bankruptcy", "Customer is in bankruptcy proceedings", Legal, LegalOutcome, &["function_2"]),
        scenario("legal_attorney_representation", "Customer has attorney", "Customer is represented by legal counsel", Legal, Transfer, &["transfer"]),
        scenario("legal_cease_desist", "Customer demands cease and desist", "Customer formally requests no more contact", Legal, LegalOutcome, &["function_2"]),
        scenario("legal_dispute_debt", "Customer formally disputes debt", "Customer legally disputes the debt validity", Legal, LegalOutcome, &["function_2"]),
        scenario("legal_identity_theft", "Customer claims identity theft", "Customer says debt is from identity theft", Legal, LegalOutcome, &["function_2"]),
        scenario("legal_deceased_debtor", "Debtor is deceased", "Family member reports debtor has died", Legal, LegalOutcome, &["function_2"]),
        scenario("legal_military_deployment", "Customer is deployed military", "Customer is on military deployment", Legal, LegalOutcome, &["function_2"]),
        scenario("legal_statute_limitations", "Customer claims statute of limitations", "Customer says debt is too old to collect", Legal, LegalOutcome, &["function_2"]),
        scenario("legal_fraud_claim", "Customer claims fraud", "Customer says the debt is fraudulent", Legal, LegalOutcome, &["function_2"]),
        scenario("legal_court_order", "Customer has court order", "Customer has court order regarding debt", Legal, LegalOutcome, &["function_2"]),
        // Special circumstances (51-60)
        scenario("special_elderly_confusion", "Elderly customer is confused", "Elderly person doesn't understand the situation", Vulnerable, Transfer, &["transfer"]),
        scenario("special_mental_health", "Customer has mental health issues", "Customer appears to have mental health challenges", Vulnerable, Transfer, &["transfer"]),
        scenario("special_disability", "Customer has disability", "Customer has physical or cognitive disability", Vulnerable, Transfer, &["transfer"]),
        scenario("special_non_english", "Customer doesn't speak English", "Customer needs interpreter services", Vulnerable, Transfer, &["transfer"]),
        scenario("special_minor_child", "Minor child answers phone", "Child under 18 answers the call", Vulnerable, Disconnect, &["disconnect"]),
        scenario("special_hospitalized", "Customer is hospitalized", "Customer is currently in hospital", Hardship, Neutral, &["function_1"]),
        scenario("special_incarcerated", "Customer is in jail/prison", "Customer is currently incarcerated", Hardship, Neutral, &["function_2"]),
        scenario("special_natural_disaster", "Customer affected by natural disaster", "Customer's area hit by hurricane, flood, etc.", Hardship, Neutral, &["function_1"]),
        scenario("special_covid_impact", "Customer affected by pandemic", "Customer lost job/income due to COVID-19", Hardship, Negative, &["function_1"]),
        scenario("special_military_active", "Active military service member", "Customer is active duty military", Legal, LegalOutcome, &["function_2"]),
        // Business and employment related (61-70)
        scenario("business_workplace_call", "Called customer at workplace", "Agent reaches customer at their job", Distracted, Neutral, &["function_1"]),
        scenario("business_employer_contact", "Employer answers phone", "Customer's boss or HR answers", WrongPerson, Transfer, &["transfer"]),
        scenario("business_self_employed", "Customer is self-employed", "Customer runs their own business", Negotiating, Neutral, &["function_1"]),
        scenario("business_seasonal_worker", "Customer is seasonal worker", "Customer only works certain times of year", Hardship, Negative, &["function_1"]),
        scenario("business_commission_based", "Customer works on commission", "Customer's income varies by performance", Hardship, Negative, &["function_1"]),
        scenario("business_recently_fired", "Customer was recently fired", "Customer lost job recently", Hardship, Negative, &["function_1"]),
        scenario("business_retirement", "Customer is retired", "Customer is on fixed retirement income", Hardship, Negative, &["function_1"]),
        scenario("business_student", "Customer is a student", "Customer is in school with limited income", Hardship, Negative, &["function_1"]),
        scenario("business_gig_worker", "Customer is gig worker", "Customer drives for Uber, delivers food, etc.", Hardship, Negative, &["function_1"]),
        scenario("business_new_job", "Customer just started new job", "Customer recently got employment", Cooperative, Positive, &["function_1"]),
        // Payment method issues (71-80)
        scenario("payment_no_bank_account", "Customer has no bank account", "Customer is unbanked", Negotiating, Neutral, &["function_1"]),
        scenario("payment_frozen_account", "Customer's account is frozen", "Bank account is frozen or closed", Hardship, Negative, &["function_1"]),
        scenario("payment_card_declined", "Customer's card was declined", "Payment method doesn't work", Technical, Negative, &["function_1"]),
        scenario("payment_cash_only", "Customer only has cash", "Customer wants to pay with cash", Negotiating, Neutral, &["function_1"]),
        scenario("payment_app_issues", "Customer can't use payment app", "Technical issues with the payment app", Technical, Neutral, &["function_1"]),
        scenario("payment_insufficient_funds", "Customer has insufficient funds", "Not enough money in account", Hardship, Negative, &["function_1"]),
        scenario("payment_waiting_paycheck", "Customer waiting for paycheck", "Customer gets paid soon", Cooperative, Positive, &["function_1"]),
        scenario("payment_money_order", "Customer wants to pay by money order", "Customer prefers money order payment", Negotiating, Neutral, &["function_1"]),
        scenario("payment_wire_transfer", "Customer offers wire transfer", "Customer wants to wire the money", Negotiating, Neutral, &["function_1"]),
        scenario("payment_cryptocurrency", "Customer offers cryptocurrency", "Customer wants to pay with Bitcoin, etc.", Negotiating, Negative, &["function_1"]),
        // Family and personal situations (81-90)
        scenario("family_divorce", "Customer going through divorce", "Customer in divorce proceedings", Hardship, Negative, &["function_1"]),
        scenario("family_death", "Customer had death in family", "Customer dealing with family death", Hardship, Negative, &["function_1"]),
        scenario("family_new_baby", "Customer has new baby", "Customer has new child, medical expenses", Hardship, Negative, &["function_1"]),
        scenario("family_caring_elderly", "Customer caring for elderly parent", "Customer has elderly care expenses", Hardship, Negative, &["function_1"]),
        scenario("family_child_support", "Customer paying child support", "Customer has child support obligations", Hardship, Negative, &["function_1"]),
        scenario("family_domestic_violence", "Customer is domestic violence victim", "Customer in abusive relationship", Vulnerable, Transfer, &["transfer"]),
        scenario("family_addiction_issues", "Customer has addiction problems", "Customer struggling with substance abuse", Vulnerable, Transfer, &["transfer"]),
        scenario("family_housing_crisis", "Customer facing eviction", "Customer about to lose housing", Hardship, Negative, &["function_1"]),
        scenario("family_immigration_issues", "Customer has immigration problems", "Customer dealing with immigration status", Hardship, Negative, &["function_1"]),
        scenario("family_multiple_debts", "Customer has multiple debts", "Customer overwhelmed with many debts", Hardship, Negative, &["function_1"]),
        // Miscellaneous edge cases (91-100)
        scenario("misc_wrong_debt_amount", "Agent has wrong debt amount", "System shows incorrect debt amount", Disputing, Neutral, &["function_2"]),
        scenario("misc_duplicate_call", "Customer already spoke to agent today", "Customer received multiple calls same day", Uncooperative, Neutral, &["function_2"]),
        scenario("misc_wrong_customer_name", "Agent has wrong customer name", "System has incorrect customer information", Disputing, Neutral, &["function_2"]),
        scenario("misc_customer_moved", "Customer moved to different country", "Customer relocated internationally", Hardship, Negative, &["function_2"]),
        scenario("misc_customer_very_polite", "Extremely polite customer", "Customer is overly courteous and apologetic", Cooperative, Positive, &["function_1"]),
        scenario("misc_customer_suspicious", "Customer acts suspiciously", "Customer behavior seems unusual or evasive", Uncooperative, Negative, &["function_2"]),
        scenario("misc_customer_drunk", "Customer appears intoxicated", "Customer seems under the influence", Vulnerable, Disconnect, &["disconnect"]),
        scenario("misc_background_noise", "Loud background noise", "Customer in noisy environment", Distracted, Neutral, &["function_1"]),
        scenario("misc_customer_multitasking", "Customer is multitasking", "Customer distracted, doing other things", Distracted, Neutral, &["function_1"]),
        scenario("misc_perfect_resolution", "Perfect customer interaction", "Customer is ideal - polite, pays immediately", Cooperative, Positive, &["function_1"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_has_one_hundred_scenarios() {
        assert_eq!(builtin_scenarios().len(), 100);
    }

    #[test]
    fn scenario_ids_are_unique() {
        let scenarios = builtin_scenarios();
        let ids: HashSet<_> = scenarios.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), scenarios.len());
    }

    #[test]
    fn every_scenario_is_well_formed() {
        let known: HashSet<_> = special_tags().into_iter().collect();
        for s in builtin_scenarios() {
            s.ensure_valid().unwrap();
            for tag in &s.required_tags {
                assert!(known.contains(tag), "unknown tag {tag} in {}", s.id);
            }
        }
    }
}
