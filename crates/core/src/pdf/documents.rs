//! Layouts for the printed documents.

use super::{Column, Layout, Letterhead};
use crate::models::{
    BillLine, DoctorSummary, Examination, LabOrder, LabOrderTest, LabTestDetail, PatientSummary,
    PrescriptionView, RadiologyReport, Totals,
};
use crate::time::Timestamp;
use crate::vocab::PaymentMode;

const FOOTER: &str = "This is a computer generated document.";

fn money(amount: f64) -> String {
    format!("{amount:.2}")
}

fn patient_fields(patient: Option<&PatientSummary>) -> Vec<(String, String)> {
    let Some(p) = patient else {
        return Vec::new();
    };
    vec![
        ("UHID".into(), p.uhid.clone()),
        ("Patient".into(), p.name.to_string()),
        ("Age / Sex".into(), format!("{} / {}", p.age, p.gender)),
        ("Mobile".into(), p.mobile.to_string()),
    ]
}

fn doctor_fields(doctor: Option<&DoctorSummary>) -> Vec<(String, String)> {
    doctor
        .map(|d| {
            vec![(
                "Doctor".into(),
                format!("{} ({})", d.name, d.specialization),
            )]
        })
        .unwrap_or_default()
}

/// Everything a printed bill needs, for either desk.
pub struct BillDocument<'a> {
    pub title: &'a str,
    pub number: &'a str,
    pub date: Timestamp,
    pub patient: Option<&'a PatientSummary>,
    pub doctor: Option<&'a DoctorSummary>,
    /// Extra header fields, such as admission and discharge dates.
    pub details: Vec<(&'static str, String)>,
    pub lines: &'a [BillLine],
    pub totals: &'a Totals,
    pub payment_mode: Option<PaymentMode>,
}

pub fn bill_layout(letterhead: &Letterhead, bill: &BillDocument<'_>) -> Layout {
    let mut header = vec![
        ("Bill No".to_owned(), bill.number.to_owned()),
        ("Date".to_owned(), letterhead.date(bill.date)),
    ];
    header.extend(patient_fields(bill.patient));
    header.extend(doctor_fields(bill.doctor));
    header.extend(bill.details.iter().map(|(k, v)| ((*k).to_owned(), v.clone())));

    let rows = bill
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            vec![
                (i + 1).to_string(),
                line.name.clone(),
                line.category.to_string(),
                line.quantity.to_string(),
                money(line.price),
                money(line.amount),
            ]
        })
        .collect();

    let totals = bill.totals;
    let mut summary = vec![
        ("Total".to_owned(), money(totals.total_amount)),
        ("Discount".to_owned(), money(totals.discount)),
        ("Net Amount".to_owned(), money(totals.net_amount)),
        ("Paid".to_owned(), money(totals.paid_amount)),
        ("Due".to_owned(), money(totals.due_amount)),
    ];
    if let Some(mode) = bill.payment_mode {
        summary.push(("Payment Mode".to_owned(), mode.label().to_owned()));
    }

    Layout::new(format!("{} {}", bill.title, bill.number))
        .title(letterhead.hospital_name())
        .subtitle(bill.title)
        .fields(header)
        .spacer()
        .table(
            vec![
                Column::left("#", 0.06),
                Column::left("Service", 0.40),
                Column::left("Category", 0.16),
                Column::right("Qty", 0.08),
                Column::right("Rate", 0.15),
                Column::right("Amount", 0.15),
            ],
            rows,
        )
        .spacer()
        .fields(summary)
        .footer(FOOTER)
}

pub fn prescription_layout(
    letterhead: &Letterhead,
    view: &PrescriptionView,
    examination: Option<&Examination>,
) -> Layout {
    let p = &view.prescription;
    let mut header = vec![
        ("Visit".to_owned(), view.visit_code.clone().unwrap_or_default()),
        ("Date".to_owned(), letterhead.date(p.created_at)),
    ];
    header.extend(patient_fields(view.patient.as_ref()));
    header.extend(doctor_fields(view.doctor.as_ref()));

    let mut layout = Layout::new("Prescription")
        .title(letterhead.hospital_name())
        .subtitle("Prescription")
        .fields(header);

    if let Some(exam) = examination {
        let v = &exam.vitals;
        let reading = |value: Option<f64>, unit: &str| {
            value.map(|x| format!("{x} {unit}").trim_end().to_owned()).unwrap_or_default()
        };
        layout = layout
            .heading("Examination")
            .fields(vec![
                ("BP".into(), v.blood_pressure.clone().unwrap_or_default()),
                ("Pulse".into(), reading(v.pulse, "/min")),
                ("Temp".into(), reading(v.temperature, "F")),
                ("SpO2".into(), reading(v.spo2, "%")),
                ("Weight".into(), reading(v.weight, "kg")),
                ("Height".into(), reading(v.height, "cm")),
                ("Resp. Rate".into(), reading(v.respiratory_rate, "/min")),
            ])
            .fields(vec![
                ("Complaint".into(), exam.chief_complaint.clone().unwrap_or_default()),
                ("Findings".into(), exam.findings.clone().unwrap_or_default()),
                ("Diagnosis".into(), exam.diagnosis.clone().unwrap_or_default()),
            ]);
    }

    let rows = p
        .medicines
        .iter()
        .enumerate()
        .map(|(i, m)| {
            vec![
                (i + 1).to_string(),
                m.name.to_string(),
                m.dosage.to_string(),
                m.frequency.to_string(),
                m.duration.to_string(),
                m.instructions.clone().unwrap_or_default(),
            ]
        })
        .collect();
    layout = layout.heading("Rx").table(
        vec![
            Column::left("#", 0.05),
            Column::left("Medicine", 0.30),
            Column::left("Dosage", 0.13),
            Column::left("Frequency", 0.14),
            Column::left("Duration", 0.13),
            Column::left("Instructions", 0.25),
        ],
        rows,
    );

    if let Some(advice) = &p.advice {
        layout = layout.heading("Advice").paragraph(advice.as_str());
    }
    if let Some(date) = p.follow_up_date {
        layout = layout
            .spacer()
            .paragraph(format!("Follow up on {}", date.format("%d-%m-%Y")));
    }
    layout.footer(FOOTER)
}

pub fn lab_report_layout(
    letterhead: &Letterhead,
    order: &LabOrder,
    patient: Option<&PatientSummary>,
    tests: &[LabTestDetail],
) -> Layout {
    let mut header = vec![
        ("Accession".to_owned(), order.accession_number.clone()),
        ("Ordered".to_owned(), letterhead.date(order.created_at)),
    ];
    header.extend(patient_fields(patient));

    let mut layout = Layout::new(format!("Lab Report {}", order.accession_number))
        .title(letterhead.hospital_name())
        .subtitle("Laboratory Report")
        .fields(header);

    for detail in tests {
        let test = &detail.test;
        let mut heading = test.name.clone();
        if let Some(sample) = test.sample_type {
            heading.push_str(&format!(" ({sample})"));
        }
        let rows = detail
            .parameters
            .iter()
            .map(|p| {
                let (value, flag) = match &p.result {
                    Some(r) => (
                        r.value.clone(),
                        if r.is_abnormal == Some(true) { "H/L" } else { "" },
                    ),
                    None => (String::new(), ""),
                };
                let range = p
                    .references
                    .iter()
                    .map(|r| r.display_range())
                    .collect::<Vec<_>>()
                    .join("; ");
                vec![
                    p.parameter.name.to_string(),
                    value,
                    flag.to_owned(),
                    p.parameter.unit.clone().unwrap_or_default(),
                    range,
                ]
            })
            .collect();
        layout = layout.heading(heading).table(
            vec![
                Column::left("Parameter", 0.30),
                Column::right("Result", 0.16),
                Column::left("Flag", 0.08),
                Column::left("Unit", 0.14),
                Column::left("Reference", 0.32),
            ],
            rows,
        );
        if let Some(remarks) = &test.remarks {
            layout = layout.paragraph(format!("Remarks: {remarks}"));
        }
        let status = match test.authorized_at {
            Some(at) => format!("Authorised on {}", letterhead.date(at)),
            None => "Provisional: not yet authorised".to_owned(),
        };
        layout = layout.paragraph(status);
    }
    layout.footer(FOOTER)
}

pub fn radiology_layout(
    letterhead: &Letterhead,
    accession: &str,
    patient: Option<&PatientSummary>,
    test: &LabOrderTest,
    report: &RadiologyReport,
) -> Layout {
    let mut header = vec![
        ("Accession".to_owned(), accession.to_owned()),
        ("Reported".to_owned(), letterhead.date(report.updated_at)),
    ];
    header.extend(patient_fields(patient));

    let mut layout = Layout::new(format!("Radiology Report {accession}"))
        .title(letterhead.hospital_name())
        .subtitle(test.name.as_str())
        .fields(header)
        .heading("Findings")
        .paragraph(report.content.as_str());
    if let Some(impression) = &report.impression {
        layout = layout.heading("Impression").paragraph(impression.as_str());
    }
    if let Some(at) = test.authorized_at {
        layout = layout.spacer().paragraph(format!("Authorised on {}", letterhead.date(at)));
    }
    layout.footer(FOOTER)
}
