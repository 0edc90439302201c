use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::errors::AppError;
use crate::models::DespesaLinha;
use crate::money;

/// Writes the expense report as UTF-8, comma-delimited text with a header
/// row. Amounts are rendered float-style ("150.0"), the apartment column
/// shows the joined label or "-" when unassigned.
pub fn despesas_csv(despesas: &[DespesaLinha], path: &Path) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["ID", "Descrição", "Valor", "Vencimento", "Pago", "Apartamento"])?;
    for d in despesas {
        writer.write_record([
            d.id.to_string(),
            d.descricao.clone(),
            money::format_float(d.valor_centavos),
            d.vencimento.clone(),
            d.pago.as_str().to_string(),
            d.apartamento.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the expense report as a paginated A4 PDF: a bold title with the
/// current date, then one line per expense, flowing onto further pages as
/// needed.
pub fn despesas_pdf(despesas: &[DespesaLinha], path: &Path) -> Result<(), AppError> {
    // A4 geometry in millimetres; content starts near the top edge and a new
    // page begins once the cursor hits the bottom margin.
    let (page_w, page_h) = (210.0, 297.0);
    let margin_x = 14.0;
    let title_y = 282.0;
    let line_step = 6.35;
    let bottom_y = 14.0;

    let (doc, primeira_pagina, primeira_camada) =
        PdfDocument::new("Relatório de Despesas", Mm(page_w), Mm(page_h), "conteudo");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AppError::Report(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| AppError::Report(e.to_string()))?;

    let mut camada = doc.get_page(primeira_pagina).get_layer(primeira_camada);
    let hoje = chrono::Local::now().format("%d/%m/%Y");
    camada.use_text(
        format!("Relatório de Despesas – {}", hoje),
        14.0,
        Mm(margin_x),
        Mm(title_y),
        &bold,
    );

    let mut y = title_y - line_step * 2.0;
    for d in despesas {
        let linha = format!(
            "{} – {} – R$ {} – {}",
            d.id,
            d.descricao,
            money::format_reais(d.valor_centavos),
            d.vencimento
        );
        camada.use_text(linha, 11.0, Mm(margin_x), Mm(y), &regular);
        y -= line_step;
        if y < bottom_y {
            let (pagina, nova_camada) = doc.add_page(Mm(page_w), Mm(page_h), "conteudo");
            camada = doc.get_page(pagina).get_layer(nova_camada);
            y = title_y;
        }
    }

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| AppError::Report(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SimNao;

    fn linha(id: i64, descricao: &str, centavos: i64, apartamento: &str) -> DespesaLinha {
        DespesaLinha {
            id,
            descricao: descricao.into(),
            valor_centavos: centavos,
            valor: money::format_reais(centavos),
            vencimento: "2024-01-05".into(),
            pago: SimNao::Nao,
            apartamento_id: 0,
            apartamento: apartamento.into(),
        }
    }

    #[test]
    fn csv_matches_expected_layout() {
        let path = std::env::temp_dir().join("condominio_despesas_csv_test.csv");
        despesas_csv(&[linha(1, "Condo fee", 15000, "-")], &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("ID,Descrição,Valor,Vencimento,Pago,Apartamento")
        );
        assert_eq!(lines.next(), Some("1,Condo fee,150.0,2024-01-05,NAO,-"));
        assert_eq!(lines.next(), None);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn csv_keeps_fractional_amounts() {
        let path = std::env::temp_dir().join("condominio_despesas_csv_frac_test.csv");
        despesas_csv(&[linha(2, "Água", 15055, "101-A")], &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("2,Água,150.55,2024-01-05,NAO,101-A"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn pdf_is_written_and_paginates() {
        let path = std::env::temp_dir().join("condominio_despesas_pdf_test.pdf");
        // Enough lines to overflow the first A4 page.
        let despesas: Vec<DespesaLinha> = (1..=80)
            .map(|i| linha(i, "Taxa condominial", 15000, "101-A"))
            .collect();
        despesas_pdf(&despesas, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 1000);
        std::fs::remove_file(&path).ok();
    }
}
